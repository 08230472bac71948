//! Use-case services orchestrating the core components.
//!
//! # Responsibility
//! - Catalog lifecycle: editing, persistence, export/publication, import.
//! - Order composition and submission, including the anonymous public path.
//!
//! # Invariants
//! - Every catalog mutation is persisted before the operation returns.
//! - Service APIs never bypass repository or store contracts.

pub mod catalog_service;
pub mod order_service;
