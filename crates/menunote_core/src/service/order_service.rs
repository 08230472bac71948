//! Order composition and submission.
//!
//! # Responsibility
//! - Build order note content in the canonical grammar the parser reads
//!   back (builder→parser round trip is a contract, not a coincidence).
//! - Submit orders for the authenticated owner and for anonymous customers
//!   resolving a shared public link.
//!
//! # Invariants
//! - Generated item lines always use the compact grammar bound to the menu
//!   via the first-line `#menu:<id>` token.
//! - Submission failures are definite and surfaced; nothing is retried or
//!   swallowed here.

use crate::model::catalog::Menu;
use crate::model::note::{Note, Visibility};
use crate::remote::note_store::{NewNote, NoteStore, NoteStoreError};
use crate::resolve::{resolve_public_menu, ResolveRequest};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One picked menu item with a quantity, addressed by item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPick {
    pub item_id: String,
    pub quantity: u32,
}

/// Order composition/submission error for the owner path.
#[derive(Debug)]
pub enum OrderError {
    /// No picked item resolved to a positive quantity.
    EmptySelection,
    Store(NoteStoreError),
}

impl Display for OrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "order has no items with a positive quantity"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::EmptySelection => None,
        }
    }
}

impl From<NoteStoreError> for OrderError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

/// Renders one compact item line, with the price decoration when known.
fn format_item_line(name: &str, quantity: u32, unit_price: Option<f64>) -> String {
    match unit_price {
        Some(price) => {
            let amount = price * f64::from(quantity);
            format!("- {name} × {quantity} × ¥{price} = ¥{amount:.2}")
        }
        None => format!("- {name} × {quantity}"),
    }
}

/// Builds order note content for the owner flow.
///
/// Picks with zero quantity or unknown item ids contribute nothing; an order
/// with no effective items is rejected.
pub fn build_order_content(
    menu: &Menu,
    picks: &[OrderPick],
    note: Option<&str>,
) -> Result<String, OrderError> {
    let mut lines = vec![format!("#order #menu:{}", menu.id), String::new()];
    lines.push(format!("**Menu**: {}", menu.name));
    lines.push(String::new());

    let mut total_quantity: u32 = 0;
    let mut total_amount = 0.0;
    let mut any_priced = false;
    // Menu order, not pick order: the note reads like the menu.
    for item in &menu.items {
        let quantity = picks
            .iter()
            .filter(|pick| pick.item_id == item.id)
            .map(|pick| pick.quantity)
            .sum::<u32>();
        if quantity == 0 {
            continue;
        }
        total_quantity += quantity;
        if let Some(price) = item.price {
            any_priced = true;
            total_amount += price * f64::from(quantity);
        }
        lines.push(format_item_line(&item.name, quantity, item.price));
    }

    if total_quantity == 0 {
        return Err(OrderError::EmptySelection);
    }

    lines.push(String::new());
    if any_priced {
        lines.push(format!(
            "**Total**: {total_quantity} items, ¥{total_amount:.2}"
        ));
    } else {
        lines.push(format!("**Total**: {total_quantity} items"));
    }

    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        lines.push(String::new());
        lines.push(format!("**Note**: {note}"));
    }

    Ok(lines.join("\n"))
}

/// Creates one order note (Protected) for the catalog owner.
pub fn submit_order<S: NoteStore>(
    store: &mut S,
    menu: &Menu,
    picks: &[OrderPick],
    note: Option<&str>,
) -> Result<Note, OrderError> {
    let content = build_order_content(menu, picks, note)?;
    let created = store.create_note(NewNote {
        content,
        visibility: Visibility::Protected,
    })?;
    info!(
        "event=order_submit module=order status=ok note_id={} menu_id={}",
        created.id, menu.id
    );
    Ok(created)
}

/// Anonymous order submission payload (the public HTTP body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrderRequest {
    /// Note id hint carried in the shared link, if any.
    pub note_id_hint: Option<String>,
    pub public_id: String,
    pub customer_name: String,
    pub note: Option<String>,
    pub items: Vec<PublicOrderItem>,
}

/// One requested item of an anonymous order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrderItem {
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
}

/// Anonymous submission error.
#[derive(Debug)]
pub enum PublicOrderError {
    MissingField(&'static str),
    /// Resolution exhausted every tier; the menu is not publicly orderable.
    MenuUnavailable,
    EmptySelection,
    Store(NoteStoreError),
}

impl Display for PublicOrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::MenuUnavailable => write!(f, "menu is not public or not found"),
            Self::EmptySelection => write!(f, "order has no items with a positive quantity"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PublicOrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteStoreError> for PublicOrderError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

/// Submits an anonymous order against a published menu.
///
/// Resolves the public token through the tier chain (no local catalog on
/// this path), builds canonical order content and creates a Public note on
/// behalf of the menu owner. The created note id is the order reference.
pub fn submit_public_order<S: NoteStore>(
    store: &mut S,
    request: &PublicOrderRequest,
    page_cap: usize,
) -> Result<Note, PublicOrderError> {
    if request.public_id.trim().is_empty() {
        return Err(PublicOrderError::MissingField("publicId"));
    }
    if request.customer_name.trim().is_empty() {
        return Err(PublicOrderError::MissingField("customerName"));
    }
    if request.items.is_empty() {
        return Err(PublicOrderError::MissingField("items"));
    }

    let resolve_request = ResolveRequest {
        public_id: request.public_id.clone(),
        note_id_hint: request.note_id_hint.clone(),
    };
    let resolved = resolve_public_menu(store, None, &resolve_request, page_cap)
        .map_err(|_| PublicOrderError::MenuUnavailable)?;
    let menu = resolved.menu;

    let mut lines = vec![format!("#order #menu:{}", menu.id), String::new()];
    lines.push(format!("**Customer**: {}", request.customer_name.trim()));
    lines.push(format!("**Menu**: {}", menu.name));
    lines.push(String::new());

    let mut total_quantity: u32 = 0;
    for item in &request.items {
        if item.quantity == 0 || item.name.trim().is_empty() {
            continue;
        }
        // Price comes from the resolved menu, not the request: anonymous
        // callers must not set their own prices.
        let price = menu
            .items
            .iter()
            .find(|menu_item| menu_item.id == item.item_id)
            .and_then(|menu_item| menu_item.price);
        total_quantity += item.quantity;
        lines.push(format_item_line(item.name.trim(), item.quantity, price));
    }
    if total_quantity == 0 {
        return Err(PublicOrderError::EmptySelection);
    }

    if let Some(note) = request.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        lines.push(String::new());
        lines.push(format!("**Note**: {note}"));
    }

    let created = store.create_note(NewNote {
        content: lines.join("\n"),
        visibility: Visibility::Public,
    })?;
    info!(
        "event=public_order_submit module=order status=ok note_id={} menu_id={} tier={}",
        created.id, menu.id, resolved.tier
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::{build_order_content, format_item_line, OrderError, OrderPick};
    use crate::model::catalog::{Menu, MenuItem};

    fn lunch_menu() -> Menu {
        let mut menu = Menu::new("lunch", "Lunch");
        let mut rice = MenuItem::new("fried-rice", "Fried Rice");
        rice.price = Some(18.0);
        menu.items.push(rice);
        menu.items.push(MenuItem::new("tea", "Tea"));
        menu
    }

    #[test]
    fn item_lines_carry_price_decoration_only_when_priced() {
        assert_eq!(
            format_item_line("Fried Rice", 2, Some(18.0)),
            "- Fried Rice × 2 × ¥18 = ¥36.00"
        );
        assert_eq!(format_item_line("Tea", 1, None), "- Tea × 1");
    }

    #[test]
    fn content_binds_menu_and_lists_picked_items_in_menu_order() {
        let picks = vec![
            OrderPick {
                item_id: "tea".to_string(),
                quantity: 1,
            },
            OrderPick {
                item_id: "fried-rice".to_string(),
                quantity: 2,
            },
        ];
        let content = build_order_content(&lunch_menu(), &picks, Some("no scallions")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "#order #menu:lunch");
        let rice_pos = lines
            .iter()
            .position(|l| l.starts_with("- Fried Rice"))
            .unwrap();
        let tea_pos = lines.iter().position(|l| l.starts_with("- Tea")).unwrap();
        assert!(rice_pos < tea_pos);
        assert!(content.contains("**Total**: 3 items, ¥36.00"));
        assert!(content.contains("**Note**: no scallions"));
    }

    #[test]
    fn all_zero_selection_is_rejected() {
        let picks = vec![OrderPick {
            item_id: "tea".to_string(),
            quantity: 0,
        }];
        let err = build_order_content(&lunch_menu(), &picks, None).unwrap_err();
        assert!(matches!(err, OrderError::EmptySelection));
    }
}
