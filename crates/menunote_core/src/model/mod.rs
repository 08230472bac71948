//! Domain records for the order/menu core.
//!
//! # Responsibility
//! - Define the read models consumed from the note-storage service.
//! - Define the locally owned catalog shapes and the derived order views.
//!
//! # Invariants
//! - `Note` and `AttachmentRef` are read-only here; the remote service owns
//!   their lifecycle.
//! - A `Menu` with `allow_public_order` set always carries a `public_id`.

pub mod catalog;
pub mod note;
pub mod order;
