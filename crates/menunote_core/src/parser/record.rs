//! Note classification and record extraction.
//!
//! # Responsibility
//! - Detect order/menu-def/menu-pub records by tag or inline token.
//! - Parse order item lines (legacy and compact grammars) and the JSON
//!   payloads of catalog-definition and menu-publication notes.
//!
//! # Invariants
//! - The menu binding token is only honored on the first content line.
//! - Item grammars are tried in order per line; the first match wins and a
//!   non-matching line contributes nothing.
//! - No function here returns an error; absence is the only failure signal.

use crate::model::catalog::{Catalog, Menu, MenuItem, CATALOG_PAYLOAD_VERSION};
use crate::model::note::Note;
use crate::model::order::OrderItem;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tag marking an order note.
pub const ORDER_TAG: &str = "order";
/// Tag marking a catalog-definition note.
pub const MENU_DEF_TAG: &str = "menu-def";
/// Tag marking a single-published-menu note.
pub const MENU_PUB_TAG: &str = "menu-pub";
/// Discriminator value inside a published-menu JSON payload.
pub const PUBLISHED_MENU_KIND: &str = "menu-public";
/// Payload version written for published menus.
pub const PUBLISHED_MENU_PAYLOAD_VERSION: u32 = 1;

static ORDER_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#order\b").expect("valid order token regex"));
static MENU_DEF_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#menu-def\b").expect("valid menu-def token regex"));
static MENU_PUB_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#menu-pub\b").expect("valid menu-pub token regex"));
static MENU_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#menu:([A-Za-z0-9_-]+)").expect("valid menu ref regex"));
static LEGACY_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*-\s*name:"([^"]+)"\s+qty:(\d+)(?:\s+price:(\d+(?:\.\d+)?))?"#)
        .expect("valid legacy item regex")
});
static COMPACT_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-\s*(.+?)\s*×\s*(\d+)(?:\s*×\s*¥\s*(\d+(?:\.\d+)?))?")
        .expect("valid compact item regex")
});
static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```\s*json\s*(.*?)```").expect("valid json fence regex"));

/// Record kind recovered from one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSignal {
    Order,
    MenuDef,
    MenuPub,
}

/// Raw result of order-content parsing, before totals are derived.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderDraft {
    pub menu_id: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Whether the note is an order: `order` tag OR inline `#order` token.
pub fn is_order_note(note: &Note) -> bool {
    note.has_tag(ORDER_TAG) || ORDER_TOKEN_RE.is_match(&note.content)
}

fn is_menu_def_note(note: &Note) -> bool {
    note.has_tag(MENU_DEF_TAG) || MENU_DEF_TOKEN_RE.is_match(&note.content)
}

fn is_menu_pub_note(note: &Note) -> bool {
    note.has_tag(MENU_PUB_TAG) || MENU_PUB_TOKEN_RE.is_match(&note.content)
}

/// Classifies one note by tag or inline token.
pub fn classify(note: &Note) -> Option<RecordSignal> {
    if is_order_note(note) {
        Some(RecordSignal::Order)
    } else if is_menu_def_note(note) {
        Some(RecordSignal::MenuDef)
    } else if is_menu_pub_note(note) {
        Some(RecordSignal::MenuPub)
    } else {
        None
    }
}

/// Extracts the menu binding and item lines from order content.
pub fn parse_order(content: &str) -> OrderDraft {
    let mut lines = content.lines();
    let menu_id = lines
        .next()
        .and_then(|first| MENU_REF_RE.captures(first))
        .map(|caps| caps[1].to_string());

    let mut items = Vec::new();
    for line in content.lines() {
        if let Some(item) = parse_item_line(line) {
            items.push(item);
        }
    }
    OrderDraft { menu_id, items }
}

/// Tries the item grammars in order; `None` for lines matching neither.
fn parse_item_line(line: &str) -> Option<OrderItem> {
    let (name, quantity, price) = if let Some(caps) = LEGACY_ITEM_RE.captures(line) {
        (
            caps[1].to_string(),
            caps[2].parse::<u32>().ok()?,
            caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()),
        )
    } else if let Some(caps) = COMPACT_ITEM_RE.captures(line) {
        (
            caps[1].trim().to_string(),
            caps[2].parse::<u32>().ok()?,
            caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()),
        )
    } else {
        return None;
    };

    if quantity == 0 || name.is_empty() {
        return None;
    }
    Some(OrderItem {
        name,
        quantity,
        unit_price: price,
    })
}

/// Cuts the JSON body out of note text.
///
/// A fenced ```json block wins; otherwise the substring starting at the
/// earliest `{` or `[` is used. `None` when neither is present.
fn extract_json_body(text: &str) -> Option<&str> {
    if let Some(caps) = JSON_FENCE_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str());
    }
    let starts = [text.find('{'), text.find('[')];
    let start = starts.into_iter().flatten().min()?;
    Some(&text[start..])
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default = "default_catalog_version")]
    version: u32,
    menus: Vec<Menu>,
}

fn default_catalog_version() -> u32 {
    CATALOG_PAYLOAD_VERSION
}

/// Published-menu wire payload (`kind` discriminates it from catalogs).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishedMenuPayload {
    pub version: u32,
    pub kind: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(rename = "allowOrder", default)]
    pub allow_order: bool,
}

impl PublishedMenuPayload {
    /// Wraps one menu for publication. The menu must carry its public token.
    pub fn from_menu(menu: &Menu, public_id: String) -> Self {
        Self {
            version: PUBLISHED_MENU_PAYLOAD_VERSION,
            kind: PUBLISHED_MENU_KIND.to_string(),
            public_id,
            id: menu.id.clone(),
            name: menu.name.clone(),
            items: menu.items.clone(),
            allow_order: true,
        }
    }

    fn into_menu(self) -> Menu {
        Menu {
            id: self.id,
            name: self.name,
            items: self.items,
            allow_public_order: self.allow_order,
            public_id: Some(self.public_id),
        }
    }
}

/// Parses catalog JSON out of note text.
///
/// Accepts the versioned `{version, menus}` document or a bare menu array
/// (legacy exports). Any malformed payload yields `None`.
pub fn parse_catalog_payload(text: &str) -> Option<Catalog> {
    let body = extract_json_body(text)?;
    if let Ok(doc) = serde_json::from_str::<CatalogDocument>(body) {
        return Some(Catalog {
            version: doc.version,
            menus: doc.menus,
        });
    }
    serde_json::from_str::<Vec<Menu>>(body)
        .ok()
        .map(|menus| Catalog {
            version: CATALOG_PAYLOAD_VERSION,
            menus,
        })
}

/// Parses a single published menu out of note text.
///
/// Expects the discriminated `menu-public` object; a catalog payload is also
/// accepted by taking its first menu (legacy shim).
pub fn parse_published_menu_payload(text: &str) -> Option<Menu> {
    let body = extract_json_body(text)?;
    if let Ok(payload) = serde_json::from_str::<PublishedMenuPayload>(body) {
        if payload.kind == PUBLISHED_MENU_KIND {
            return Some(payload.into_menu());
        }
    }
    parse_catalog_payload(text).and_then(|catalog| catalog.menus.into_iter().next())
}
