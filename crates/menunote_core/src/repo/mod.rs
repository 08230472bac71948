//! Repository layer for locally persisted state.
//!
//! # Responsibility
//! - Define the persisted catalog slot contract.
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - Writes are atomic per slot; readers never observe a partial catalog.
//! - Read paths reject corrupt persisted state instead of masking it.

pub mod catalog_repo;
