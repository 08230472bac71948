//! Derived order views recovered from order-tagged notes.
//!
//! # Responsibility
//! - Define the structured interpretation of one order note.
//! - Compute the total invariants in exactly one place.
//!
//! # Invariants
//! - `total_quantity` equals the sum of item quantities.
//! - `total_amount` is present iff at least one item carries a price, and
//!   sums `quantity * unit_price` over priced items only.
//! - Parsed orders hold no independent state; they are safe to discard and
//!   recompute from the note snapshot at any time.

use crate::model::note::Note;

/// One line item of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub name: String,
    /// Always at least 1; zero-quantity lines are dropped by the parser.
    pub quantity: u32,
    pub unit_price: Option<f64>,
}

/// Structured interpretation of one order-tagged note.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOrder {
    /// The note this order was recovered from.
    pub note: Note,
    /// Menu binding from the first-line `#menu:<id>` token, if any.
    pub menu_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_quantity: u32,
    pub total_amount: Option<f64>,
}

impl ParsedOrder {
    /// Builds a parsed order, deriving both totals from the items.
    pub fn from_parts(note: Note, menu_id: Option<String>, items: Vec<OrderItem>) -> Self {
        let total_quantity = items.iter().map(|item| item.quantity).sum();
        let mut amount = 0.0;
        let mut any_priced = false;
        for item in &items {
            if let Some(price) = item.unit_price {
                any_priced = true;
                amount += price * f64::from(item.quantity);
            }
        }
        Self {
            note,
            menu_id,
            items,
            total_quantity,
            total_amount: any_priced.then_some(amount),
        }
    }
}
