//! Catalog distribution codec: note-text encoding with size-gated chunking.
//!
//! # Responsibility
//! - Publish catalogs (`#menu-def`) and single menus (`#menu-pub`) as notes,
//!   inline when the payload fits, attachment-backed when it does not.
//! - Decode published notes back into catalogs/menus, trying the note text
//!   first and the JSON attachment second.
//!
//! # Invariants
//! - The placeholder note is created before its attachment, so a visible
//!   note always has its payload dereferenceable.
//! - A published menu's placeholder carries `publicId:<token>` so bounded
//!   scans can match it without fetching the attachment.
//! - Decode failures are silent (`None`); candidates are skippable.

use crate::model::catalog::{Catalog, Menu};
use crate::model::note::{Note, Visibility};
use crate::parser::record::{
    classify, parse_catalog_payload, parse_published_menu_payload, PublishedMenuPayload,
    RecordSignal, MENU_DEF_TAG, MENU_PUB_TAG,
};
use crate::remote::note_store::{NewNote, NoteStore, NoteStoreError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default inline-payload ceiling, aligned with the service's per-note
/// content limit. Callers may pass any other limit.
pub const DEFAULT_INLINE_LIMIT_BYTES: usize = 8 * 1024;

const ATTACHMENT_MIME_TYPE: &str = "application/json";

/// How a payload was distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStrategy {
    /// JSON embedded in the note text inside a fenced block.
    Inline,
    /// Placeholder note plus an `application/json` attachment.
    Attachment,
}

/// Coordinates of one published payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRecord {
    /// The note carrying (or pointing at) the payload.
    pub note_id: String,
    /// The menu's public token; absent for catalog definitions.
    pub public_id: Option<String>,
    pub strategy: PublishStrategy,
}

/// Payload recovered from one published note.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Catalog(Catalog),
    Menu(Menu),
}

/// Publication failure. Store errors are definite and surfaced to the user.
#[derive(Debug)]
pub enum PublishError {
    /// A menu must carry its public token before publication.
    MissingPublicId,
    /// The payload could not be serialized.
    Encode(String),
    Store(NoteStoreError),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPublicId => write!(f, "menu has no public id assigned"),
            Self::Encode(details) => write!(f, "payload serialization failed: {details}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteStoreError> for PublishError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

struct EncodingPlan {
    inline_content: String,
    placeholder_content: String,
    attachment_filename: String,
    attachment_bytes: Vec<u8>,
    visibility: Visibility,
    public_id: Option<String>,
}

/// Publishes the whole catalog as a `#menu-def` note (Protected).
pub fn publish_catalog<S: NoteStore>(
    store: &mut S,
    catalog: &Catalog,
    inline_limit: usize,
) -> Result<PublicationRecord, PublishError> {
    let pretty = serde_json::to_string_pretty(catalog)
        .map_err(|err| PublishError::Encode(err.to_string()))?;
    let compact =
        serde_json::to_vec(catalog).map_err(|err| PublishError::Encode(err.to_string()))?;
    let plan = EncodingPlan {
        inline_content: format!("#{MENU_DEF_TAG}\n\n```json\n{pretty}\n```"),
        placeholder_content: format!(
            "#{MENU_DEF_TAG}\n\n(Catalog is large; published as a JSON attachment. \
             Import reads the attachment automatically.)"
        ),
        attachment_filename: format!("menu-def-v{}.json", catalog.version),
        attachment_bytes: compact,
        visibility: Visibility::Protected,
        public_id: None,
    };
    execute_plan(store, plan, inline_limit)
}

/// Publishes one menu as a `#menu-pub` note (Public).
///
/// The menu must already carry its public token; publication never invents
/// one, so the token stays stable across republications.
pub fn publish_menu<S: NoteStore>(
    store: &mut S,
    menu: &Menu,
    inline_limit: usize,
) -> Result<PublicationRecord, PublishError> {
    let public_id = menu
        .public_id
        .clone()
        .ok_or(PublishError::MissingPublicId)?;
    let payload = PublishedMenuPayload::from_menu(menu, public_id.clone());
    let pretty = serde_json::to_string_pretty(&payload)
        .map_err(|err| PublishError::Encode(err.to_string()))?;
    let compact =
        serde_json::to_vec(&payload).map_err(|err| PublishError::Encode(err.to_string()))?;
    let plan = EncodingPlan {
        inline_content: format!("#{MENU_PUB_TAG}\n\n```json\n{pretty}\n```"),
        placeholder_content: format!(
            "#{MENU_PUB_TAG}\npublicId:{public_id}\n\n(Menu is large; published as a JSON attachment.)"
        ),
        attachment_filename: format!("menu-public-{public_id}.json"),
        attachment_bytes: compact,
        visibility: Visibility::Public,
        public_id: Some(public_id),
    };
    execute_plan(store, plan, inline_limit)
}

fn execute_plan<S: NoteStore>(
    store: &mut S,
    plan: EncodingPlan,
    inline_limit: usize,
) -> Result<PublicationRecord, PublishError> {
    if plan.inline_content.len() <= inline_limit {
        let note = store.create_note(NewNote {
            content: plan.inline_content,
            visibility: plan.visibility,
        })?;
        info!(
            "event=catalog_publish module=codec status=ok strategy=inline note_id={}",
            note.id
        );
        return Ok(PublicationRecord {
            note_id: note.id,
            public_id: plan.public_id,
            strategy: PublishStrategy::Inline,
        });
    }

    // Two network steps, note first: once the note is visible its payload
    // attachment must already be linkable to it.
    let note = store.create_note(NewNote {
        content: plan.placeholder_content,
        visibility: plan.visibility,
    })?;
    store.create_attachment(
        &note.id,
        &plan.attachment_filename,
        ATTACHMENT_MIME_TYPE,
        plan.attachment_bytes,
    )?;
    info!(
        "event=catalog_publish module=codec status=ok strategy=attachment note_id={}",
        note.id
    );
    Ok(PublicationRecord {
        note_id: note.id,
        public_id: plan.public_id,
        strategy: PublishStrategy::Attachment,
    })
}

/// Decodes a published note back into its payload.
///
/// The note's own text is authoritative when it parses; otherwise the first
/// JSON-typed attachment is fetched and parsed. Only after both sources fail
/// is the candidate discarded.
pub fn decode_note<S: NoteStore>(store: &S, note: &Note) -> Option<DecodedPayload> {
    match classify(note) {
        Some(RecordSignal::MenuPub) => {
            if let Some(menu) = parse_published_menu_payload(&note.content) {
                return Some(DecodedPayload::Menu(menu));
            }
            attachment_text(store, note)
                .and_then(|text| parse_published_menu_payload(&text))
                .map(DecodedPayload::Menu)
        }
        Some(RecordSignal::MenuDef) => {
            if let Some(catalog) = parse_catalog_payload(&note.content) {
                return Some(DecodedPayload::Catalog(catalog));
            }
            attachment_text(store, note)
                .and_then(|text| parse_catalog_payload(&text))
                .map(DecodedPayload::Catalog)
        }
        _ => None,
    }
}

fn attachment_text<S: NoteStore>(store: &S, note: &Note) -> Option<String> {
    let attachment = note.first_json_attachment()?;
    match store.fetch_attachment(attachment) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(err) => {
            debug!(
                "event=attachment_fetch module=codec status=error note_id={} error={err}",
                note.id
            );
            None
        }
    }
}
