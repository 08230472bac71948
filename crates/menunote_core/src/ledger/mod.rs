//! Derived order ledger over the paginated note stream.
//!
//! # Responsibility
//! - Rebuild the aggregate order view from the accumulated note snapshot.
//! - Drive caller-paced page fetching against the note store.
//! - Provide pure read-side projections (filters, per-item aggregation).
//!
//! # Invariants
//! - `rebuild_orders` is a pure function of the snapshot; running it twice
//!   over the same notes yields identical results.
//! - Orders are sorted by `create_time_ms` descending with stable ties.
//! - Projections never mutate ledger state.
//! - After batched deletions the ledger is re-fetched, never patched.

use crate::model::note::Note;
use crate::model::order::ParsedOrder;
use crate::parser::record::{is_order_note, parse_order};
use crate::remote::note_store::{NoteStore, StoreResult};
use log::{info, warn};
use std::collections::BTreeMap;

/// Rebuilds the full order view from a note snapshot.
///
/// Non-order notes are dropped; order notes parse leniently (a note with no
/// recognizable item lines still appears, with empty items and zero totals).
pub fn rebuild_orders(notes: &[Note]) -> Vec<ParsedOrder> {
    let mut orders: Vec<ParsedOrder> = notes
        .iter()
        .filter(|note| is_order_note(note))
        .map(|note| {
            let draft = parse_order(&note.content);
            ParsedOrder::from_parts(note.clone(), draft.menu_id, draft.items)
        })
        .collect();
    // Stable sort keeps input order for equal timestamps.
    orders.sort_by(|a, b| b.note.create_time_ms.cmp(&a.note.create_time_ms));
    orders
}

/// Accumulated note snapshot plus the derived order view.
#[derive(Debug, Default)]
pub struct OrderLedger {
    notes: Vec<Note>,
    next_page_token: Option<String>,
    started: bool,
    orders: Vec<ParsedOrder>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current derived view, newest first.
    pub fn orders(&self) -> &[ParsedOrder] {
        &self.orders
    }

    /// Number of notes in the accumulated snapshot.
    pub fn snapshot_len(&self) -> usize {
        self.notes.len()
    }

    /// Whether another `fetch_next_page` call can bring in more notes.
    pub fn has_more(&self) -> bool {
        !self.started || self.next_page_token.is_some()
    }

    /// Drops the snapshot and fetches the first page again.
    pub fn refresh<S: NoteStore>(&mut self, store: &S) -> StoreResult<()> {
        self.notes.clear();
        self.orders.clear();
        self.next_page_token = None;
        self.started = false;
        self.fetch_next_page(store)?;
        Ok(())
    }

    /// Fetches one page into the snapshot and re-derives the whole view.
    ///
    /// Re-deriving from the accumulated snapshot (instead of parsing the page
    /// incrementally) keeps the rebuild idempotent: re-fetching a page never
    /// double-counts. Returns whether more pages remain.
    pub fn fetch_next_page<S: NoteStore>(&mut self, store: &S) -> StoreResult<bool> {
        if self.started && self.next_page_token.is_none() {
            return Ok(false);
        }
        let page = store.list_notes(self.next_page_token.as_deref())?;
        self.started = true;
        self.next_page_token = page.next_page_token;
        for note in page.notes {
            if let Some(existing) = self.notes.iter_mut().find(|n| n.id == note.id) {
                *existing = note;
            } else {
                self.notes.push(note);
            }
        }
        self.orders = rebuild_orders(&self.notes);
        info!(
            "event=ledger_rebuild module=ledger status=ok notes={} orders={} has_more={}",
            self.notes.len(),
            self.orders.len(),
            self.next_page_token.is_some()
        );
        Ok(self.next_page_token.is_some())
    }

    /// Distinct menu ids present in the current view, sorted.
    pub fn known_menu_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .orders
            .iter()
            .filter_map(|order| order.menu_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Keeps only orders bound to the given menu id.
pub fn filter_by_menu<'a>(orders: &'a [ParsedOrder], menu_id: &str) -> Vec<&'a ParsedOrder> {
    orders
        .iter()
        .filter(|order| order.menu_id.as_deref() == Some(menu_id))
        .collect()
}

/// Keeps only orders created inside `[start_ms, end_ms]` (either bound open).
pub fn filter_by_date_range<'a>(
    orders: impl IntoIterator<Item = &'a ParsedOrder>,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
) -> Vec<&'a ParsedOrder> {
    orders
        .into_iter()
        .filter(|order| {
            let t = order.note.create_time_ms;
            start_ms.map_or(true, |start| t >= start) && end_ms.map_or(true, |end| t <= end)
        })
        .collect()
}

/// Per-item aggregate over a set of orders.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAggregate {
    pub name: String,
    pub quantity: u32,
    /// Present iff at least one aggregated line carried a price.
    pub revenue: Option<f64>,
}

/// Sums quantity and revenue per item name, in deterministic name order.
pub fn aggregate_by_item<'a>(
    orders: impl IntoIterator<Item = &'a ParsedOrder>,
) -> Vec<ItemAggregate> {
    let mut by_name: BTreeMap<String, (u32, Option<f64>)> = BTreeMap::new();
    for order in orders {
        for item in &order.items {
            let entry = by_name.entry(item.name.clone()).or_insert((0, None));
            entry.0 += item.quantity;
            if let Some(price) = item.unit_price {
                let line = price * f64::from(item.quantity);
                entry.1 = Some(entry.1.unwrap_or(0.0) + line);
            }
        }
    }
    by_name
        .into_iter()
        .map(|(name, (quantity, revenue))| ItemAggregate {
            name,
            quantity,
            revenue,
        })
        .collect()
}

/// Outcome of a batched note deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionReport {
    pub requested: usize,
    pub deleted: usize,
}

impl DeletionReport {
    pub fn failed(&self) -> usize {
        self.requested - self.deleted
    }
}

/// Deletes notes one at a time with per-item failure isolation.
///
/// One failing deletion does not abort the batch. The caller must rebuild
/// the ledger from a fresh fetch afterwards; patching the snapshot in place
/// would diverge if some deletions failed.
pub fn delete_notes<S: NoteStore>(store: &mut S, note_ids: &[String]) -> DeletionReport {
    let mut deleted = 0;
    for note_id in note_ids {
        match store.delete_note(note_id) {
            Ok(()) => deleted += 1,
            Err(err) => {
                warn!(
                    "event=order_delete module=ledger status=error note_id={note_id} error={err}"
                );
            }
        }
    }
    info!(
        "event=order_delete_batch module=ledger status=ok requested={} deleted={}",
        note_ids.len(),
        deleted
    );
    DeletionReport {
        requested: note_ids.len(),
        deleted,
    }
}
