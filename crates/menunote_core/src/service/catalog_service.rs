//! Catalog use-case service: editing, distribution and import.
//!
//! # Responsibility
//! - Own the in-memory catalog, persisting to the slot after each mutation.
//! - Run export/publication through the codec and import through the
//!   bounded scan + merger.
//!
//! # Invariants
//! - The persisted slot always reflects the last completed mutation.
//! - A menu is published only after its `public_id` has been persisted, so
//!   the token can never differ between the slot and the published note.
//! - The import scan never fetches more than `page_cap` pages.

use crate::codec::{decode_note, publish_catalog, publish_menu, DecodedPayload, PublicationRecord, PublishError};
use crate::merge::{merge, MergeReport};
use crate::model::catalog::{slugify, Catalog, Menu, MenuItem};
use crate::parser::record::{classify, RecordSignal};
use crate::remote::note_store::{NoteStore, NoteStoreError};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `name[, price]` bulk-add line.
static BULK_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^,]+?)(?:\s*,\s*(\d+(?:\.\d+)?))?$").expect("valid bulk line regex"));

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogServiceError {
    /// Persistence failure; the mutation did not complete.
    Repo(RepoError),
    /// Remote failure on a write path (export, publish).
    Store(NoteStoreError),
    Publish(PublishError),
    DuplicateMenuId(String),
    MenuNotFound(String),
    /// Menu name yields no usable slug id.
    InvalidMenuName(String),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Publish(err) => write!(f, "{err}"),
            Self::DuplicateMenuId(id) => write!(f, "menu id already exists: `{id}`"),
            Self::MenuNotFound(id) => write!(f, "menu not found: `{id}`"),
            Self::InvalidMenuName(name) => write!(f, "menu name yields no id: `{name}`"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Publish(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NoteStoreError> for CatalogServiceError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PublishError> for CatalogServiceError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}

/// One decodable `menu-def` note found by the import scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub note_id: String,
    pub create_time_ms: i64,
    pub catalog: Catalog,
}

/// Catalog facade over a persisted slot.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
    namespace: String,
    catalog: Catalog,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// Loads the catalog slot (or an empty catalog) at startup.
    pub fn load(repo: R, namespace: impl Into<String>) -> Result<Self, CatalogServiceError> {
        let namespace = namespace.into();
        let catalog = repo.load(&namespace)?.unwrap_or_default();
        Ok(Self {
            repo,
            namespace,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn persist(&mut self) -> Result<(), CatalogServiceError> {
        self.repo.save(&self.namespace, &self.catalog)?;
        Ok(())
    }

    /// Creates an empty menu named `name`, with a slug id and a fresh public
    /// token (assigned at creation so it stays stable for the menu's life).
    pub fn add_menu(&mut self, name: &str) -> Result<String, CatalogServiceError> {
        let name = name.trim();
        let id = slugify(name);
        if id.is_empty() {
            return Err(CatalogServiceError::InvalidMenuName(name.to_string()));
        }
        if self.catalog.has_menu_id(&id) {
            return Err(CatalogServiceError::DuplicateMenuId(id));
        }

        let mut menu = Menu::new(id.clone(), name);
        menu.ensure_public_id();
        self.catalog.menus.push(menu);
        self.persist()?;
        Ok(id)
    }

    pub fn remove_menu(&mut self, menu_id: &str) -> Result<(), CatalogServiceError> {
        let before = self.catalog.menus.len();
        self.catalog.menus.retain(|m| m.id != menu_id);
        if self.catalog.menus.len() == before {
            return Err(CatalogServiceError::MenuNotFound(menu_id.to_string()));
        }
        self.persist()
    }

    /// Appends one item; the id is slugged from the name and de-duplicated
    /// within the menu.
    pub fn add_item(
        &mut self,
        menu_id: &str,
        name: &str,
        price: Option<f64>,
    ) -> Result<String, CatalogServiceError> {
        let menu = self
            .catalog
            .find_menu_mut(menu_id)
            .ok_or_else(|| CatalogServiceError::MenuNotFound(menu_id.to_string()))?;

        let item_id = unique_item_id(menu, name);
        menu.items.push(MenuItem {
            id: item_id.clone(),
            name: name.trim().to_string(),
            price,
            image: None,
        });
        self.persist()?;
        Ok(item_id)
    }

    /// Adds one item per non-blank line of `name[, price]` text.
    ///
    /// Returns the number of items added.
    pub fn bulk_add_items(
        &mut self,
        menu_id: &str,
        lines: &str,
    ) -> Result<usize, CatalogServiceError> {
        if !self.catalog.has_menu_id(menu_id) {
            return Err(CatalogServiceError::MenuNotFound(menu_id.to_string()));
        }

        let mut added = 0;
        for line in lines.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(caps) = BULK_ITEM_RE.captures(line) else {
                continue;
            };
            let name = caps[1].trim().to_string();
            if name.is_empty() {
                continue;
            }
            let price = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
            let menu = self
                .catalog
                .find_menu_mut(menu_id)
                .ok_or_else(|| CatalogServiceError::MenuNotFound(menu_id.to_string()))?;
            let item_id = unique_item_id(menu, &name);
            menu.items.push(MenuItem {
                id: item_id,
                name,
                price,
                image: None,
            });
            added += 1;
        }
        if added > 0 {
            self.persist()?;
        }
        Ok(added)
    }

    /// Enables or disables anonymous ordering for one menu.
    ///
    /// Enabling assigns a public token if the menu never had one.
    pub fn set_allow_public_order(
        &mut self,
        menu_id: &str,
        allow: bool,
    ) -> Result<Menu, CatalogServiceError> {
        let updated = {
            let menu = self
                .catalog
                .find_menu_mut(menu_id)
                .ok_or_else(|| CatalogServiceError::MenuNotFound(menu_id.to_string()))?;
            menu.allow_public_order = allow;
            if allow {
                menu.ensure_public_id();
            }
            menu.clone()
        };
        self.persist()?;
        Ok(updated)
    }

    /// Publishes the whole catalog as a `menu-def` note.
    pub fn export_to_note<S: NoteStore>(
        &self,
        store: &mut S,
        inline_limit: usize,
    ) -> Result<PublicationRecord, CatalogServiceError> {
        Ok(publish_catalog(store, &self.catalog, inline_limit)?)
    }

    /// Publishes one menu as a `menu-pub` note for anonymous ordering.
    ///
    /// The public token is assigned and persisted before the network call:
    /// the published token and the persisted one can never diverge.
    pub fn publish_menu<S: NoteStore>(
        &mut self,
        store: &mut S,
        menu_id: &str,
        inline_limit: usize,
    ) -> Result<PublicationRecord, CatalogServiceError> {
        let (assigned, menu) = {
            let menu = self
                .catalog
                .find_menu_mut(menu_id)
                .ok_or_else(|| CatalogServiceError::MenuNotFound(menu_id.to_string()))?;
            (menu.ensure_public_id(), menu.clone())
        };
        if assigned {
            self.persist()?;
        }
        Ok(publish_menu(store, &menu, inline_limit)?)
    }

    /// Scans the note stream for decodable `menu-def` candidates.
    ///
    /// At most `page_cap` pages are fetched; undecodable candidates are
    /// skipped silently.
    pub fn import_candidates<S: NoteStore>(
        &self,
        store: &S,
        page_cap: usize,
    ) -> Result<Vec<ImportCandidate>, CatalogServiceError> {
        let mut candidates = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..page_cap {
            let page = store.list_notes(page_token.as_deref())?;
            for note in &page.notes {
                if classify(note) != Some(RecordSignal::MenuDef) {
                    continue;
                }
                match decode_note(store, note) {
                    Some(DecodedPayload::Catalog(catalog)) => candidates.push(ImportCandidate {
                        note_id: note.id.clone(),
                        create_time_ms: note.create_time_ms,
                        catalog,
                    }),
                    _ => {
                        warn!(
                            "event=catalog_import module=service status=skip note_id={} reason=undecodable",
                            note.id
                        );
                    }
                }
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(candidates)
    }

    /// Merges one imported catalog into the local one and persists.
    pub fn apply_import(
        &mut self,
        incoming: Catalog,
    ) -> Result<MergeReport, CatalogServiceError> {
        let (merged, report) = merge(&self.catalog, incoming.menus);
        self.catalog = merged;
        self.persist()?;
        info!(
            "event=catalog_import module=service status=ok added={} renamed={}",
            report.added,
            report.renamed.len()
        );
        Ok(report)
    }
}

fn unique_item_id(menu: &Menu, name: &str) -> String {
    let base = {
        let slug = slugify(name);
        if slug.is_empty() {
            "item".to_string()
        } else {
            slug
        }
    };
    let mut candidate = base.clone();
    let mut counter = 2;
    while menu.items.iter().any(|item| item.id == candidate) {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    candidate
}
