use menunote_core::{
    decode_note, publish_catalog, publish_menu, Catalog, DecodedPayload, InMemoryNoteStore, Menu,
    MenuItem, NoteStore, PublishError, PublishStrategy, Visibility, DEFAULT_INLINE_LIMIT_BYTES,
};

fn sample_catalog() -> Catalog {
    let mut lunch = Menu::new("lunch", "Lunch");
    let mut rice = MenuItem::new("fried-rice", "Fried Rice");
    rice.price = Some(18.0);
    lunch.items.push(rice);
    lunch.items.push(MenuItem::new("tea", "Jasmine Tea"));

    let mut dinner = Menu::new("dinner", "Dinner");
    dinner.items.push(MenuItem::new("dumplings", "Dumplings"));

    Catalog {
        version: 2,
        menus: vec![lunch, dinner],
    }
}

fn published_menu() -> Menu {
    let mut menu = Menu::new("lunch", "Lunch");
    menu.items.push(MenuItem::new("fried-rice", "Fried Rice"));
    menu.allow_public_order = true;
    menu.public_id = Some("a-stable-public-token".to_string());
    menu
}

#[test]
fn inline_catalog_round_trip_preserves_ids_and_names() {
    let mut store = InMemoryNoteStore::new();
    let record =
        publish_catalog(&mut store, &sample_catalog(), DEFAULT_INLINE_LIMIT_BYTES).unwrap();
    assert_eq!(record.strategy, PublishStrategy::Inline);
    assert_eq!(record.public_id, None);

    let note = store.get_note(&record.note_id).unwrap().unwrap();
    assert_eq!(note.visibility, Visibility::Protected);
    assert!(note.content.starts_with("#menu-def"));

    let Some(DecodedPayload::Catalog(decoded)) = decode_note(&store, &note) else {
        panic!("catalog note should decode to a catalog");
    };
    let original = sample_catalog();
    assert_eq!(decoded.version, original.version);
    for (got, want) in decoded.menus.iter().zip(&original.menus) {
        assert_eq!(got.id, want.id);
        assert_eq!(got.name, want.name);
        for (gi, wi) in got.items.iter().zip(&want.items) {
            assert_eq!(gi.id, wi.id);
            assert_eq!(gi.name, wi.name);
        }
    }
}

#[test]
fn oversized_catalog_is_always_attachment_backed_and_recoverable() {
    let mut catalog = sample_catalog();
    // Images are the usual reason a catalog outgrows the note limit.
    catalog.menus[0].items[0].image = Some("x".repeat(3 * DEFAULT_INLINE_LIMIT_BYTES));

    let mut store = InMemoryNoteStore::new();
    let record = publish_catalog(&mut store, &catalog, DEFAULT_INLINE_LIMIT_BYTES).unwrap();
    assert_eq!(record.strategy, PublishStrategy::Attachment);

    let note = store.get_note(&record.note_id).unwrap().unwrap();
    assert!(note.content.len() <= DEFAULT_INLINE_LIMIT_BYTES);
    assert_eq!(note.attachments.len(), 1);
    assert_eq!(note.attachments[0].mime_type, "application/json");

    let Some(DecodedPayload::Catalog(decoded)) = decode_note(&store, &note) else {
        panic!("attachment-backed catalog should decode");
    };
    assert_eq!(decoded.menus.len(), 2);
    assert_eq!(
        decoded.menus[0].items[0].image.as_deref().map(str::len),
        Some(3 * DEFAULT_INLINE_LIMIT_BYTES)
    );
}

#[test]
fn published_menu_keeps_its_public_id_across_strategies() {
    let menu = published_menu();

    let mut store = InMemoryNoteStore::new();
    let inline = publish_menu(&mut store, &menu, DEFAULT_INLINE_LIMIT_BYTES).unwrap();
    assert_eq!(inline.strategy, PublishStrategy::Inline);
    assert_eq!(inline.public_id.as_deref(), Some("a-stable-public-token"));

    let note = store.get_note(&inline.note_id).unwrap().unwrap();
    assert_eq!(note.visibility, Visibility::Public);
    let Some(DecodedPayload::Menu(decoded)) = decode_note(&store, &note) else {
        panic!("menu-pub note should decode to a menu");
    };
    assert_eq!(decoded.public_id.as_deref(), Some("a-stable-public-token"));
    assert!(decoded.allow_public_order);

    // Attachment path: placeholder must still carry the token inline so
    // bounded scans can match without fetching the payload.
    let mut large = menu.clone();
    large.items[0].image = Some("y".repeat(2 * DEFAULT_INLINE_LIMIT_BYTES));
    let attached = publish_menu(&mut store, &large, DEFAULT_INLINE_LIMIT_BYTES).unwrap();
    assert_eq!(attached.strategy, PublishStrategy::Attachment);

    let placeholder = store.get_note(&attached.note_id).unwrap().unwrap();
    assert!(placeholder
        .content
        .contains("publicId:a-stable-public-token"));
    let Some(DecodedPayload::Menu(decoded)) = decode_note(&store, &placeholder) else {
        panic!("attachment-backed menu should decode");
    };
    assert_eq!(decoded.public_id.as_deref(), Some("a-stable-public-token"));
}

#[test]
fn menu_publication_without_public_id_is_rejected() {
    let mut store = InMemoryNoteStore::new();
    let menu = Menu::new("lunch", "Lunch");
    let err = publish_menu(&mut store, &menu, DEFAULT_INLINE_LIMIT_BYTES).unwrap_err();
    assert!(matches!(err, PublishError::MissingPublicId));
    assert!(store.is_empty());
}

#[test]
fn decode_tries_text_first_then_attachment() {
    let mut store = InMemoryNoteStore::new();
    // Placeholder-style note with no inline payload and no attachment yet.
    let note = store
        .create_note(menunote_core::NewNote {
            content: "#menu-def\n\n(payload pending)".to_string(),
            visibility: Visibility::Protected,
        })
        .unwrap();
    assert_eq!(decode_note(&store, &note), None);

    let payload = serde_json::to_vec(&sample_catalog()).unwrap();
    store
        .create_attachment(&note.id, "menu-def-v2.json", "application/json", payload)
        .unwrap();
    let note = store.get_note(&note.id).unwrap().unwrap();
    assert!(matches!(
        decode_note(&store, &note),
        Some(DecodedPayload::Catalog(_))
    ));
}
