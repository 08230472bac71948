//! Core domain logic for MenuNote: order/menu records layered on top of a
//! generic append-only note-storage service.
//! This crate is the single source of truth for business invariants.

pub mod codec;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod merge;
pub mod model;
pub mod parser;
pub mod remote;
pub mod repo;
pub mod resolve;
pub mod service;

pub use codec::{
    decode_note, publish_catalog, publish_menu, DecodedPayload, PublicationRecord, PublishError,
    PublishStrategy, DEFAULT_INLINE_LIMIT_BYTES,
};
pub use ledger::{
    aggregate_by_item, delete_notes, filter_by_date_range, filter_by_menu, rebuild_orders,
    DeletionReport, ItemAggregate, OrderLedger,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use merge::{merge, MergeReport};
pub use model::catalog::{generate_public_id, slugify, Catalog, Menu, MenuItem};
pub use model::note::{AttachmentContent, AttachmentRef, Note, Visibility};
pub use model::order::{OrderItem, ParsedOrder};
pub use parser::record::{classify, is_order_note, parse_order, OrderDraft, RecordSignal};
pub use remote::memory::InMemoryNoteStore;
pub use remote::note_store::{NewNote, NotePage, NoteStore, NoteStoreError, StoreResult};
pub use repo::catalog_repo::{
    CatalogRepository, RepoError, RepoResult, SqliteCatalogRepository, DEFAULT_CATALOG_NAMESPACE,
};
pub use resolve::{
    resolve_public_menu, DirectLookupTier, DirectNoteTier, LocalCatalogTier, NotFound,
    PublicMenuResolver, PublicScanTier, ResolveRequest, ResolveTier, ResolvedMenu, TierOutcome,
    DEFAULT_SCAN_PAGE_CAP,
};
pub use service::catalog_service::{CatalogService, CatalogServiceError, ImportCandidate};
pub use service::order_service::{
    build_order_content, submit_order, submit_public_order, OrderError, OrderPick,
    PublicOrderError, PublicOrderItem, PublicOrderRequest,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
