//! Read models for records owned by the note-storage service.
//!
//! # Responsibility
//! - Mirror the service's note/attachment shapes for local consumption.
//! - Keep tag handling normalized so classification stays case-insensitive.
//!
//! # Invariants
//! - Notes are never mutated locally; deletion is requested via the store.
//! - Attachment payloads are immutable once created.

use serde::{Deserialize, Serialize};

/// Visibility levels enforced by the note-storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

/// Attachment payload location: inline bytes or a dereferenceable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentContent {
    Bytes(Vec<u8>),
    Url(String),
}

/// Reference to one binary attachment linked to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Service-assigned attachment resource id.
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub content: AttachmentContent,
}

impl AttachmentRef {
    /// Whether this attachment plausibly carries a JSON payload.
    ///
    /// Matches the service convention: JSON mime type or a `.json` filename.
    pub fn is_json(&self) -> bool {
        self.mime_type.contains("json") || self.filename.to_lowercase().ends_with(".json")
    }
}

/// One note as returned by the storage service.
///
/// The content is free text; tags and inline tokens are the only structure
/// this core relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Service-assigned note resource id.
    pub id: String,
    pub content: String,
    /// Tags as reported by the service, normalized to lowercase.
    pub tags: Vec<String>,
    pub visibility: Visibility,
    /// Creation timestamp in epoch milliseconds.
    pub create_time_ms: i64,
    pub attachments: Vec<AttachmentRef>,
}

impl Note {
    /// Case-insensitive tag membership test.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Returns the first attachment that looks like a JSON payload.
    pub fn first_json_attachment(&self) -> Option<&AttachmentRef> {
        self.attachments.iter().find(|a| a.is_json())
    }
}
