//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `menunote_core` linkage.
//! - Walk the publish → resolve → order → ledger path against the in-memory
//!   store so the whole pipeline can be eyeballed without a backend.

use menunote_core::{
    aggregate_by_item, resolve_public_menu, submit_public_order, InMemoryNoteStore, Menu,
    MenuItem, OrderLedger, PublicOrderItem, PublicOrderRequest, ResolveRequest,
    DEFAULT_INLINE_LIMIT_BYTES, DEFAULT_SCAN_PAGE_CAP,
};

fn main() {
    println!("menunote_core ping={}", menunote_core::ping());
    println!("menunote_core version={}", menunote_core::core_version());

    if let Err(message) = run_demo() {
        eprintln!("demo failed: {message}");
        std::process::exit(1);
    }
}

fn run_demo() -> Result<(), String> {
    let mut store = InMemoryNoteStore::new();

    let mut menu = Menu::new("lunch", "Lunch");
    let mut rice = MenuItem::new("fried-rice", "Fried Rice");
    rice.price = Some(18.0);
    menu.items.push(rice);
    menu.allow_public_order = true;
    menu.ensure_public_id();
    let public_id = menu.public_id.clone().unwrap_or_default();

    let record = menunote_core::publish_menu(&mut store, &menu, DEFAULT_INLINE_LIMIT_BYTES)
        .map_err(|err| err.to_string())?;
    println!(
        "published menu note={} strategy={:?}",
        record.note_id, record.strategy
    );

    let request = ResolveRequest {
        public_id: public_id.clone(),
        note_id_hint: Some(record.note_id.clone()),
    };
    let resolved = resolve_public_menu(&store, None, &request, DEFAULT_SCAN_PAGE_CAP)
        .map_err(|err| err.to_string())?;
    println!(
        "resolved menu `{}` via tier {}",
        resolved.menu.name, resolved.tier
    );

    let order = submit_public_order(
        &mut store,
        &PublicOrderRequest {
            note_id_hint: Some(record.note_id),
            public_id,
            customer_name: "Walk-in".to_string(),
            note: None,
            items: vec![PublicOrderItem {
                item_id: "fried-rice".to_string(),
                name: "Fried Rice".to_string(),
                quantity: 2,
            }],
        },
        DEFAULT_SCAN_PAGE_CAP,
    )
    .map_err(|err| err.to_string())?;
    println!("order note created: {}", order.id);

    let mut ledger = OrderLedger::new();
    ledger.refresh(&store).map_err(|err| err.to_string())?;
    for aggregate in aggregate_by_item(ledger.orders()) {
        println!(
            "aggregate: {} qty={} revenue={:?}",
            aggregate.name, aggregate.quantity, aggregate.revenue
        );
    }
    Ok(())
}
