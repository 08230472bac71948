//! Persisted catalog slot: contract and SQLite implementation.
//!
//! # Responsibility
//! - Load the catalog at startup and rewrite it after every mutation.
//! - Enforce the public-ordering invariant before anything is persisted.
//!
//! # Invariants
//! - One JSON blob per namespace; a rewrite replaces it wholesale.
//! - A catalog containing a publicly orderable menu without a `public_id`
//!   is never written.
//! - Corrupt persisted payloads surface as errors; catalog persistence must
//!   not silently lose a write.

use crate::db::DbError;
use crate::model::catalog::Catalog;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Namespace used by the single-catalog client.
pub const DEFAULT_CATALOG_NAMESPACE: &str = "menu.catalog";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for the catalog slot.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted payload exists but cannot be decoded.
    InvalidData(String),
    /// A menu allows public ordering but carries no public token.
    PublicOrderInvariant { menu_id: String },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted catalog payload: {message}")
            }
            Self::PublicOrderInvariant { menu_id } => write!(
                f,
                "menu `{menu_id}` allows public ordering without a public id"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Contract for the persisted catalog slot.
pub trait CatalogRepository {
    /// Loads the catalog for one namespace; `None` when never saved.
    fn load(&self, namespace: &str) -> RepoResult<Option<Catalog>>;
    /// Rewrites the slot for one namespace atomically.
    fn save(&mut self, namespace: &str, catalog: &Catalog) -> RepoResult<()>;
}

/// SQLite-backed catalog slot.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        if !table_exists(conn, "catalog_slots")? {
            return Err(RepoError::MissingRequiredTable("catalog_slots"));
        }
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn load(&self, namespace: &str) -> RepoResult<Option<Catalog>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM catalog_slots WHERE namespace = ?1;",
                [namespace],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => {
                let catalog = serde_json::from_str::<Catalog>(&raw)
                    .map_err(|err| RepoError::InvalidData(err.to_string()))?;
                Ok(Some(catalog))
            }
            None => Ok(None),
        }
    }

    fn save(&mut self, namespace: &str, catalog: &Catalog) -> RepoResult<()> {
        for menu in &catalog.menus {
            if !menu.public_order_invariant_holds() {
                return Err(RepoError::PublicOrderInvariant {
                    menu_id: menu.id.clone(),
                });
            }
        }

        let payload = serde_json::to_string(catalog)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        self.conn.execute(
            "INSERT INTO catalog_slots (namespace, version, payload, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(namespace) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![namespace, catalog.version, payload],
        )?;
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
