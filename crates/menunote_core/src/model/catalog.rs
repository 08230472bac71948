//! Catalog domain model: menus, menu items, and the versioned catalog.
//!
//! # Responsibility
//! - Define the JSON payload shapes shared across export, publication and
//!   import (field names match the wire format: `allowOrder`, `publicId`).
//! - Provide slug and public-token helpers used by editing and merge paths.
//!
//! # Invariants
//! - `Menu::public_id` is present and high-entropy whenever
//!   `allow_public_order` is set; once assigned it never changes.
//! - Item order inside a menu is insertion order and is meaningful.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload version written by catalog export.
pub const CATALOG_PAYLOAD_VERSION: u32 = 2;

/// One orderable entry of a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Unit price; absent for menus that do not track prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Opaque blob reference (data URL or attachment URL), passed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: None,
            image: None,
        }
    }
}

/// A named menu with orderable entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    /// Unique within one catalog.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    /// Whether anonymous ordering against this menu is allowed.
    #[serde(rename = "allowOrder", default)]
    pub allow_public_order: bool,
    /// Unguessable token granting anonymous access. Stable once assigned.
    #[serde(rename = "publicId", default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

impl Menu {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
            allow_public_order: false,
            public_id: None,
        }
    }

    /// Assigns a fresh public token if none exists yet.
    ///
    /// Returns whether a token was assigned by this call.
    pub fn ensure_public_id(&mut self) -> bool {
        if self.public_id.is_some() {
            return false;
        }
        self.public_id = Some(generate_public_id());
        true
    }

    /// Whether this menu satisfies the public-ordering invariant.
    pub fn public_order_invariant_holds(&self) -> bool {
        !self.allow_public_order || self.public_id.is_some()
    }
}

/// The full collection of menus owned by one client instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    #[serde(default)]
    pub menus: Vec<Menu>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: CATALOG_PAYLOAD_VERSION,
            menus: Vec::new(),
        }
    }
}

impl Catalog {
    pub fn find_menu(&self, menu_id: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.id == menu_id)
    }

    pub fn find_menu_mut(&mut self, menu_id: &str) -> Option<&mut Menu> {
        self.menus.iter_mut().find(|m| m.id == menu_id)
    }

    pub fn has_menu_id(&self, menu_id: &str) -> bool {
        self.find_menu(menu_id).is_some()
    }
}

/// Derives a lowercase ASCII slug from free-form text.
///
/// Non-alphanumeric runs collapse to single dashes; leading and trailing
/// dashes are dropped. May return an empty string for symbol-only input.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Generates a fresh high-entropy public token (32 hex chars).
pub fn generate_public_id() -> String {
    Uuid::new_v4().simple().to_string()
}
