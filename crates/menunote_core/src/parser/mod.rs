//! Record recovery from unstructured note text.
//!
//! # Responsibility
//! - Classify notes into order / menu-definition / menu-publication records.
//! - Extract structured payloads from human-editable free text.
//!
//! # Invariants
//! - Parsing is advisory: malformed input yields `None`/empty results and
//!   never an error past this module's boundary.

pub mod record;
