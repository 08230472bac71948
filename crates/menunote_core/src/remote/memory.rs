//! In-memory note store with the remote service's observable semantics.
//!
//! # Responsibility
//! - Back integration tests and local probes without a network.
//! - Reproduce newest-first listing, offset-token pagination, content-derived
//!   tags and the anonymous public-menu lookup scan.
//!
//! # Invariants
//! - Creation timestamps are strictly monotonic, so listing order is stable.
//! - Pagination tokens are opaque to callers and only valid for this store.

use crate::model::note::{AttachmentContent, AttachmentRef, Note, Visibility};
use crate::remote::note_store::{NewNote, NotePage, NoteStore, NoteStoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_PAGE_SIZE: usize = 50;
/// Page cap of the service-side anonymous lookup scan.
const LOOKUP_PAGE_CAP: usize = 5;

static TAG_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_-]+)").expect("valid tag token regex"));

/// Reference `NoteStore` backed by process memory.
pub struct InMemoryNoteStore {
    notes: Vec<Note>,
    next_note_seq: u64,
    next_attachment_seq: u64,
    clock_ms: i64,
    page_size: usize,
}

impl Default for InMemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            next_note_seq: 1,
            next_attachment_seq: 1,
            clock_ms: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the listing page size (pagination tests use small pages).
    pub fn with_page_size(page_size: usize) -> Self {
        let mut store = Self::new();
        store.page_size = page_size.max(1);
        store
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes newest-first, the order `list_notes` pages through.
    fn newest_first(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().rev()
    }
}

/// Derives tags from inline `#token` occurrences, the way the service
/// rebuilds a note's payload from its content.
fn derive_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for caps in TAG_TOKEN_RE.captures_iter(content) {
        let tag = caps[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn parse_page_token(token: Option<&str>) -> StoreResult<usize> {
    match token {
        None => Ok(0),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| NoteStoreError::Rejected(format!("invalid page token `{raw}`"))),
    }
}

impl NoteStore for InMemoryNoteStore {
    fn create_note(&mut self, note: NewNote) -> StoreResult<Note> {
        self.clock_ms += 1_000;
        let id = format!("notes/{}", self.next_note_seq);
        self.next_note_seq += 1;
        let created = Note {
            id,
            tags: derive_tags(&note.content),
            content: note.content,
            visibility: note.visibility,
            create_time_ms: self.clock_ms,
            attachments: Vec::new(),
        };
        self.notes.push(created.clone());
        Ok(created)
    }

    fn list_notes(&self, page_token: Option<&str>) -> StoreResult<NotePage> {
        let offset = parse_page_token(page_token)?;
        let notes: Vec<Note> = self
            .newest_first()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let consumed = offset + notes.len();
        let next_page_token = (consumed < self.notes.len()).then(|| consumed.to_string());
        Ok(NotePage {
            notes,
            next_page_token,
        })
    }

    fn get_note(&self, note_id: &str) -> StoreResult<Option<Note>> {
        Ok(self.notes.iter().find(|n| n.id == note_id).cloned())
    }

    fn delete_note(&mut self, note_id: &str) -> StoreResult<()> {
        let position = self.notes.iter().position(|n| n.id == note_id);
        match position {
            Some(index) => {
                self.notes.remove(index);
                Ok(())
            }
            None => Err(NoteStoreError::NotFound(note_id.to_string())),
        }
    }

    fn create_attachment(
        &mut self,
        note_id: &str,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> StoreResult<AttachmentRef> {
        let attachment = AttachmentRef {
            id: format!("attachments/{}", self.next_attachment_seq),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            content: AttachmentContent::Bytes(bytes),
        };
        self.next_attachment_seq += 1;

        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| NoteStoreError::NotFound(note_id.to_string()))?;
        note.attachments.push(attachment.clone());
        Ok(attachment)
    }

    fn fetch_attachment(&self, attachment: &AttachmentRef) -> StoreResult<Vec<u8>> {
        match &attachment.content {
            AttachmentContent::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentContent::Url(url) => Err(NoteStoreError::Unavailable(format!(
                "no transport configured for attachment URL `{url}`"
            ))),
        }
    }

    fn lookup_public_menu(
        &self,
        public_id: &str,
        note_id_hint: Option<&str>,
    ) -> StoreResult<Option<Note>> {
        let matches = |note: &Note| {
            note.visibility == Visibility::Public
                && note.content.contains("#menu-pub")
                && note.content.contains(public_id)
        };

        if let Some(hint) = note_id_hint {
            if let Some(note) = self.get_note(hint)? {
                if matches(&note) {
                    return Ok(Some(note));
                }
            }
            // Stale hint: fall through to the scan.
        }

        let scan_limit = LOOKUP_PAGE_CAP * self.page_size;
        for note in self.newest_first().take(scan_limit) {
            if matches(note) {
                return Ok(Some(note.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryNoteStore;
    use crate::model::note::Visibility;
    use crate::remote::note_store::{NewNote, NoteStore};

    fn new_note(content: &str, visibility: Visibility) -> NewNote {
        NewNote {
            content: content.to_string(),
            visibility,
        }
    }

    #[test]
    fn listing_is_newest_first_and_paginates_with_tokens() {
        let mut store = InMemoryNoteStore::with_page_size(2);
        for i in 1..=5 {
            store
                .create_note(new_note(&format!("note {i}"), Visibility::Private))
                .unwrap();
        }

        let first = store.list_notes(None).unwrap();
        assert_eq!(first.notes.len(), 2);
        assert_eq!(first.notes[0].content, "note 5");

        let second = store
            .list_notes(first.next_page_token.as_deref())
            .unwrap();
        assert_eq!(second.notes[0].content, "note 3");

        let third = store
            .list_notes(second.next_page_token.as_deref())
            .unwrap();
        assert_eq!(third.notes.len(), 1);
        assert!(third.next_page_token.is_none());
    }

    #[test]
    fn tags_are_derived_from_inline_tokens() {
        let mut store = InMemoryNoteStore::new();
        let note = store
            .create_note(new_note("#order #menu:lunch\n- Tea × 1", Visibility::Protected))
            .unwrap();
        assert!(note.tags.contains(&"order".to_string()));
        assert!(note.tags.contains(&"menu".to_string()));
    }

    #[test]
    fn public_lookup_requires_public_visibility_and_both_markers() {
        let mut store = InMemoryNoteStore::new();
        store
            .create_note(new_note("#menu-pub\npublicId:tok-1", Visibility::Private))
            .unwrap();
        assert!(store.lookup_public_menu("tok-1", None).unwrap().is_none());

        let published = store
            .create_note(new_note("#menu-pub\npublicId:tok-1", Visibility::Public))
            .unwrap();
        let found = store.lookup_public_menu("tok-1", None).unwrap().unwrap();
        assert_eq!(found.id, published.id);

        // A stale hint falls back to the scan.
        let found = store
            .lookup_public_menu("tok-1", Some("notes/999"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, published.id);
    }
}
