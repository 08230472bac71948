use menunote_core::db::open_db_in_memory;
use menunote_core::{
    parse_order, CatalogService, CatalogServiceError, InMemoryNoteStore, NoteStore,
    PublicOrderItem, PublicOrderRequest, PublishStrategy, SqliteCatalogRepository,
    DEFAULT_CATALOG_NAMESPACE, DEFAULT_INLINE_LIMIT_BYTES, DEFAULT_SCAN_PAGE_CAP,
};

fn service(
    conn: &mut rusqlite::Connection,
) -> CatalogService<SqliteCatalogRepository<'_>> {
    let repo = SqliteCatalogRepository::try_new(conn).unwrap();
    CatalogService::load(repo, DEFAULT_CATALOG_NAMESPACE).unwrap()
}

#[test]
fn editing_operations_persist_across_reload() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut svc = service(&mut conn);
        let menu_id = svc.add_menu("Lunch Menu").unwrap();
        assert_eq!(menu_id, "lunch-menu");
        svc.add_item(&menu_id, "Fried Rice", Some(18.0)).unwrap();
        let added = svc
            .bulk_add_items(&menu_id, "Dumplings, 12.5\nJasmine Tea\n\n")
            .unwrap();
        assert_eq!(added, 2);
    }

    let svc = service(&mut conn);
    let menu = svc.catalog().find_menu("lunch-menu").unwrap();
    assert_eq!(menu.items.len(), 3);
    assert_eq!(menu.items[0].id, "fried-rice");
    assert_eq!(menu.items[1].price, Some(12.5));
    assert_eq!(menu.items[2].price, None);
    // The slug id was assigned at creation together with a public token.
    assert!(menu.public_id.is_some());
}

#[test]
fn duplicate_and_unnameable_menus_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = service(&mut conn);
    svc.add_menu("Lunch").unwrap();

    let duplicate = svc.add_menu("Lunch").unwrap_err();
    assert!(matches!(duplicate, CatalogServiceError::DuplicateMenuId(_)));

    let unnameable = svc.add_menu("午餐").unwrap_err();
    assert!(matches!(unnameable, CatalogServiceError::InvalidMenuName(_)));
}

#[test]
fn enabling_public_order_assigns_a_stable_token() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = service(&mut conn);
    let menu_id = svc.add_menu("Lunch").unwrap();

    let enabled = svc.set_allow_public_order(&menu_id, true).unwrap();
    let token = enabled.public_id.clone().unwrap();

    let disabled = svc.set_allow_public_order(&menu_id, false).unwrap();
    assert_eq!(disabled.public_id.as_deref(), Some(token.as_str()));

    let re_enabled = svc.set_allow_public_order(&menu_id, true).unwrap();
    assert_eq!(re_enabled.public_id.as_deref(), Some(token.as_str()));
}

#[test]
fn export_then_import_round_trips_through_the_note_stream() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = InMemoryNoteStore::new();
    {
        let mut svc = service(&mut conn);
        let menu_id = svc.add_menu("Lunch").unwrap();
        svc.add_item(&menu_id, "Fried Rice", Some(18.0)).unwrap();
        let record = svc
            .export_to_note(&mut store, DEFAULT_INLINE_LIMIT_BYTES)
            .unwrap();
        assert_eq!(record.strategy, PublishStrategy::Inline);
    }

    let mut other_conn = open_db_in_memory().unwrap();
    let mut other = {
        let repo = SqliteCatalogRepository::try_new(&mut other_conn).unwrap();
        CatalogService::load(repo, DEFAULT_CATALOG_NAMESPACE).unwrap()
    };

    let candidates = other
        .import_candidates(&store, DEFAULT_SCAN_PAGE_CAP)
        .unwrap();
    assert_eq!(candidates.len(), 1);
    let report = other.apply_import(candidates[0].catalog.clone()).unwrap();
    assert_eq!(report.added, 1);
    assert!(report.renamed.is_empty());

    let imported = other.catalog().find_menu("lunch").unwrap();
    assert_eq!(imported.items[0].name, "Fried Rice");
}

#[test]
fn importing_into_a_colliding_catalog_renames_the_incoming_menu() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = InMemoryNoteStore::new();
    let mut svc = service(&mut conn);

    let menu_id = svc.add_menu("Lunch").unwrap();
    svc.export_to_note(&mut store, DEFAULT_INLINE_LIMIT_BYTES)
        .unwrap();

    let candidates = svc
        .import_candidates(&store, DEFAULT_SCAN_PAGE_CAP)
        .unwrap();
    let report = svc.apply_import(candidates[0].catalog.clone()).unwrap();
    assert_eq!(
        report.renamed,
        vec![(menu_id.clone(), format!("{menu_id}-imported"))]
    );
    assert!(svc.catalog().has_menu_id("lunch"));
    assert!(svc.catalog().has_menu_id("lunch-imported"));
}

#[test]
fn published_menu_resolves_and_accepts_anonymous_orders() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = InMemoryNoteStore::new();
    let mut svc = service(&mut conn);

    let menu_id = svc.add_menu("Lunch").unwrap();
    svc.add_item(&menu_id, "Fried Rice", Some(18.0)).unwrap();
    svc.set_allow_public_order(&menu_id, true).unwrap();
    let record = svc
        .publish_menu(&mut store, &menu_id, DEFAULT_INLINE_LIMIT_BYTES)
        .unwrap();
    let public_id = record.public_id.clone().unwrap();

    let created = menunote_core::submit_public_order(
        &mut store,
        &PublicOrderRequest {
            note_id_hint: Some(record.note_id),
            public_id,
            customer_name: "Ana".to_string(),
            note: Some("less oil".to_string()),
            items: vec![PublicOrderItem {
                item_id: "fried-rice".to_string(),
                name: "Fried Rice".to_string(),
                quantity: 2,
            }],
        },
        DEFAULT_SCAN_PAGE_CAP,
    )
    .unwrap();

    // The anonymous order is a first-class order note, parseable by the
    // ledger and bound to the canonical menu id.
    let note = store.get_note(&created.id).unwrap().unwrap();
    assert!(menunote_core::is_order_note(&note));
    let draft = parse_order(&note.content);
    assert_eq!(draft.menu_id.as_deref(), Some("lunch"));
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.items[0].quantity, 2);
    assert_eq!(draft.items[0].unit_price, Some(18.0));
}

#[test]
fn anonymous_orders_against_unknown_tokens_are_refused() {
    let mut store = InMemoryNoteStore::new();
    let err = menunote_core::submit_public_order(
        &mut store,
        &PublicOrderRequest {
            note_id_hint: None,
            public_id: "no-such-token".to_string(),
            customer_name: "Ana".to_string(),
            note: None,
            items: vec![PublicOrderItem {
                item_id: "x".to_string(),
                name: "X".to_string(),
                quantity: 1,
            }],
        },
        DEFAULT_SCAN_PAGE_CAP,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        menunote_core::PublicOrderError::MenuUnavailable
    ));
    assert!(store.is_empty());
}
