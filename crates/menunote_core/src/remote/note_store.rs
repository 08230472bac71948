//! Contract for the external note-storage service.
//!
//! # Responsibility
//! - Express the create/list/get/delete/attachment surface this core needs.
//! - Model the service-side anonymous menu lookup endpoint.
//!
//! # Invariants
//! - All operations are advisory network calls; callers decide whether a
//!   failure is fatal (catalog/order writes) or skippable (scans, tiers).

use crate::model::note::{AttachmentRef, Note, Visibility};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, NoteStoreError>;

/// Transport/service failure reported by a note store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStoreError {
    /// The service could not be reached or timed out.
    Unavailable(String),
    /// The service rejected the request (validation, auth, quota).
    Rejected(String),
    /// The target record does not exist.
    NotFound(String),
    /// The operation is not offered by this backend.
    Unsupported(&'static str),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "note store unavailable: {details}"),
            Self::Rejected(details) => write!(f, "note store rejected request: {details}"),
            Self::NotFound(id) => write!(f, "note store record not found: {id}"),
            Self::Unsupported(op) => write!(f, "note store does not support `{op}`"),
        }
    }
}

impl Error for NoteStoreError {}

/// Request model for creating one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub content: String,
    pub visibility: Visibility,
}

/// One page of the note stream plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Absent when the stream is exhausted.
    pub next_page_token: Option<String>,
}

/// The narrow surface consumed from the note-storage service.
///
/// A handle represents one authorization scope: an authenticated client sees
/// its own notes through `list_notes`, an anonymous handle sees public notes
/// only. Resolution code filters on visibility regardless.
pub trait NoteStore {
    fn create_note(&mut self, note: NewNote) -> StoreResult<Note>;
    /// Lists notes newest-first; `page_token` comes from the previous page.
    fn list_notes(&self, page_token: Option<&str>) -> StoreResult<NotePage>;
    fn get_note(&self, note_id: &str) -> StoreResult<Option<Note>>;
    fn delete_note(&mut self, note_id: &str) -> StoreResult<()>;
    fn create_attachment(
        &mut self,
        note_id: &str,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> StoreResult<AttachmentRef>;
    /// Dereferences an attachment to its raw bytes.
    fn fetch_attachment(&self, attachment: &AttachmentRef) -> StoreResult<Vec<u8>>;
    /// Service-side anonymous lookup of a published menu note.
    ///
    /// Mirrors the public HTTP endpoint: the hint note id is checked first,
    /// then a bounded scan over public notes. Backends without the endpoint
    /// return [`NoteStoreError::Unsupported`].
    fn lookup_public_menu(
        &self,
        public_id: &str,
        note_id_hint: Option<&str>,
    ) -> StoreResult<Option<Note>>;
}
