//! Note-storage service SPI and reference backend.
//!
//! # Responsibility
//! - Define the narrow contract this core consumes from the remote service.
//! - Ship an in-memory backend with the service's listing and public-lookup
//!   semantics for tests and local probes.
//!
//! # Invariants
//! - This core never mutates a `Note` in place; all writes go through the
//!   store contract.

pub mod memory;
pub mod note_store;
