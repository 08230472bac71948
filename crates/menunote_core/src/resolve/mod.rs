//! Public-menu resolution: an ordered chain of lookup tiers.
//!
//! # Responsibility
//! - Resolve an opaque public token to a published menu for anonymous
//!   ordering, tolerating full unavailability of any one tier.
//! - Keep the tier chain explicit so tiers can be added, reordered and unit
//!   tested in isolation.
//!
//! # Invariants
//! - Tiers run strictly in order; the first acceptance short-circuits.
//! - A tier failure (network, decode, no match) is never fatal; only
//!   exhaustion of the whole chain yields `NotFound`.
//! - Every accepted menu has a matching `public_id` and
//!   `allow_public_order` set.

use crate::codec::{decode_note, DecodedPayload};
use crate::model::catalog::{Catalog, Menu};
use crate::model::note::{Note, Visibility};
use crate::parser::record::{classify, RecordSignal};
use crate::remote::note_store::NoteStore;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hard cap on pages fetched by the bounded public scan tier.
pub const DEFAULT_SCAN_PAGE_CAP: usize = 5;

/// Input to one resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub public_id: String,
    /// Note id carried in the shared link, if any.
    pub note_id_hint: Option<String>,
}

/// A successfully resolved menu and the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMenu {
    pub menu: Menu,
    pub tier: &'static str,
}

/// Resolution exhausted every tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no published menu matches the requested public id")
    }
}

impl Error for NotFound {}

/// Result of one tier attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    Resolved(Menu),
    NoMatch,
    /// The tier errored (network, decode, unsupported); the chain advances.
    Failed(String),
}

/// One strategy in the ordered fallback chain.
pub trait ResolveTier {
    fn name(&self) -> &'static str;
    fn attempt(&self, request: &ResolveRequest) -> TierOutcome;
}

/// Ordered-list-of-strategies evaluator.
#[derive(Default)]
pub struct PublicMenuResolver<'a> {
    tiers: Vec<Box<dyn ResolveTier + 'a>>,
}

impl<'a> PublicMenuResolver<'a> {
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    pub fn push_tier(&mut self, tier: Box<dyn ResolveTier + 'a>) {
        self.tiers.push(tier);
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Runs the chain strictly in order and returns the first acceptance.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolvedMenu, NotFound> {
        for tier in &self.tiers {
            match tier.attempt(request) {
                TierOutcome::Resolved(menu) => {
                    info!(
                        "event=menu_resolve module=resolve status=ok tier={} public_id={}",
                        tier.name(),
                        request.public_id
                    );
                    return Ok(ResolvedMenu {
                        menu,
                        tier: tier.name(),
                    });
                }
                TierOutcome::NoMatch => {
                    debug!(
                        "event=menu_resolve module=resolve status=no_match tier={}",
                        tier.name()
                    );
                }
                TierOutcome::Failed(reason) => {
                    debug!(
                        "event=menu_resolve module=resolve status=error tier={} error={reason}",
                        tier.name()
                    );
                }
            }
        }
        info!(
            "event=menu_resolve module=resolve status=not_found public_id={}",
            request.public_id
        );
        Err(NotFound)
    }
}

/// Acceptance guard applied by every tier: the decoded token must equal the
/// requested one and the menu must allow public ordering.
fn accept(menu: Menu, public_id: &str) -> Option<Menu> {
    (menu.public_id.as_deref() == Some(public_id) && menu.allow_public_order).then_some(menu)
}

fn decode_menu_note<S: NoteStore>(store: &S, note: &Note, public_id: &str) -> Option<Menu> {
    match decode_note(store, note) {
        Some(DecodedPayload::Menu(menu)) => accept(menu, public_id),
        _ => None,
    }
}

/// Tier 1: the service-side anonymous lookup endpoint.
pub struct DirectLookupTier<'a, S: NoteStore> {
    pub store: &'a S,
}

impl<S: NoteStore> ResolveTier for DirectLookupTier<'_, S> {
    fn name(&self) -> &'static str {
        "direct-lookup"
    }

    fn attempt(&self, request: &ResolveRequest) -> TierOutcome {
        match self
            .store
            .lookup_public_menu(&request.public_id, request.note_id_hint.as_deref())
        {
            Ok(Some(note)) => match decode_menu_note(self.store, &note, &request.public_id) {
                Some(menu) => TierOutcome::Resolved(menu),
                None => TierOutcome::NoMatch,
            },
            Ok(None) => TierOutcome::NoMatch,
            Err(err) => TierOutcome::Failed(err.to_string()),
        }
    }
}

/// Tier 2: direct fetch of the hinted note id.
pub struct DirectNoteTier<'a, S: NoteStore> {
    pub store: &'a S,
}

impl<S: NoteStore> ResolveTier for DirectNoteTier<'_, S> {
    fn name(&self) -> &'static str {
        "direct-note"
    }

    fn attempt(&self, request: &ResolveRequest) -> TierOutcome {
        let Some(hint) = request.note_id_hint.as_deref() else {
            return TierOutcome::NoMatch;
        };
        match self.store.get_note(hint) {
            Ok(Some(note)) if note.visibility == Visibility::Public => {
                match decode_menu_note(self.store, &note, &request.public_id) {
                    Some(menu) => TierOutcome::Resolved(menu),
                    None => TierOutcome::NoMatch,
                }
            }
            Ok(_) => TierOutcome::NoMatch,
            Err(err) => TierOutcome::Failed(err.to_string()),
        }
    }
}

/// Tier 3: bounded scan over public notes tagged `menu-pub`.
pub struct PublicScanTier<'a, S: NoteStore> {
    pub store: &'a S,
    /// Hard page cap guaranteeing termination against a large corpus.
    pub page_cap: usize,
}

impl<S: NoteStore> ResolveTier for PublicScanTier<'_, S> {
    fn name(&self) -> &'static str {
        "public-scan"
    }

    fn attempt(&self, request: &ResolveRequest) -> TierOutcome {
        let mut page_token: Option<String> = None;
        for _ in 0..self.page_cap {
            let page = match self.store.list_notes(page_token.as_deref()) {
                Ok(page) => page,
                Err(err) => return TierOutcome::Failed(err.to_string()),
            };
            for note in &page.notes {
                if note.visibility != Visibility::Public {
                    continue;
                }
                if classify(note) != Some(RecordSignal::MenuPub) {
                    continue;
                }
                if let Some(menu) = decode_menu_note(self.store, note, &request.public_id) {
                    return TierOutcome::Resolved(menu);
                }
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        TierOutcome::NoMatch
    }
}

/// Tier 4: snapshot of the locally persisted catalog. Legacy-only, no
/// network; must stay last in the chain.
pub struct LocalCatalogTier {
    pub catalog: Catalog,
}

impl ResolveTier for LocalCatalogTier {
    fn name(&self) -> &'static str {
        "local-catalog"
    }

    fn attempt(&self, request: &ResolveRequest) -> TierOutcome {
        let hit = self
            .catalog
            .menus
            .iter()
            .find(|menu| {
                menu.allow_public_order && menu.public_id.as_deref() == Some(&request.public_id)
            })
            .cloned();
        match hit {
            Some(menu) => TierOutcome::Resolved(menu),
            None => TierOutcome::NoMatch,
        }
    }
}

/// Builds the default four-tier chain and resolves one request.
///
/// `local_catalog` feeds the legacy fallback tier; anonymous endpoints that
/// keep no local catalog pass `None`.
pub fn resolve_public_menu<S: NoteStore>(
    store: &S,
    local_catalog: Option<&Catalog>,
    request: &ResolveRequest,
    page_cap: usize,
) -> Result<ResolvedMenu, NotFound> {
    let mut resolver = PublicMenuResolver::new();
    resolver.push_tier(Box::new(DirectLookupTier { store }));
    resolver.push_tier(Box::new(DirectNoteTier { store }));
    resolver.push_tier(Box::new(PublicScanTier { store, page_cap }));
    if let Some(catalog) = local_catalog {
        resolver.push_tier(Box::new(LocalCatalogTier {
            catalog: catalog.clone(),
        }));
    }
    resolver.resolve(request)
}
