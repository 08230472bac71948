//! Append-only catalog merge with id-collision renaming.
//!
//! # Responsibility
//! - Fold imported menus into the local catalog without ever touching an
//!   existing local menu.
//! - Normalize incoming menus/items so every record has an id and the
//!   public-ordering invariant holds in the merged result.
//!
//! # Invariants
//! - No two menus share an id after merge.
//! - Local menus keep their ids and contents byte-for-byte.
//! - A merged menu with `allow_public_order` always carries a `public_id`.

use crate::model::catalog::{slugify, Catalog, Menu, MenuItem};
use std::collections::BTreeSet;

/// Suffix appended (repeatedly, if needed) to colliding menu ids.
const IMPORT_SUFFIX: &str = "-imported";

/// Summary of one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub added: usize,
    /// `(incoming id or slug, id actually assigned)` for renamed menus.
    pub renamed: Vec<(String, String)>,
}

/// Merges imported menus into a copy of the local catalog.
///
/// Candidate id: the incoming id when present, else a slug of the name, else
/// `"menu"`. While the candidate collides with any id already in the merged
/// set (local ids plus ids assigned earlier in this merge), the import
/// suffix is appended and the check repeats.
pub fn merge(local: &Catalog, incoming: Vec<Menu>) -> (Catalog, MergeReport) {
    let mut merged = local.clone();
    let mut taken: BTreeSet<String> = merged.menus.iter().map(|m| m.id.clone()).collect();
    let mut report = MergeReport::default();

    for menu in incoming {
        let candidate = if menu.id.is_empty() {
            let slug = slugify(&menu.name);
            if slug.is_empty() {
                "menu".to_string()
            } else {
                slug
            }
        } else {
            menu.id.clone()
        };

        let mut assigned = candidate.clone();
        while taken.contains(&assigned) {
            assigned.push_str(IMPORT_SUFFIX);
        }
        if assigned != candidate {
            report.renamed.push((candidate, assigned.clone()));
        }
        taken.insert(assigned.clone());

        let name = if menu.name.is_empty() {
            assigned.clone()
        } else {
            menu.name
        };
        let mut normalized = Menu {
            id: assigned,
            name,
            items: menu.items.into_iter().map(normalize_item).collect(),
            allow_public_order: menu.allow_public_order,
            public_id: menu.public_id,
        };
        if normalized.allow_public_order {
            normalized.ensure_public_id();
        }

        merged.menus.push(normalized);
        report.added += 1;
    }

    (merged, report)
}

fn normalize_item(item: MenuItem) -> MenuItem {
    let id = if item.id.is_empty() {
        let slug = slugify(&item.name);
        if slug.is_empty() {
            "item".to_string()
        } else {
            slug
        }
    } else {
        item.id
    };
    MenuItem {
        id,
        name: item.name,
        price: item.price,
        image: item.image,
    }
}

#[cfg(test)]
mod tests {
    use super::merge;
    use crate::model::catalog::{Catalog, Menu, MenuItem};

    fn local_with(ids: &[&str]) -> Catalog {
        Catalog {
            version: 2,
            menus: ids.iter().map(|id| Menu::new(*id, *id)).collect(),
        }
    }

    #[test]
    fn colliding_id_gets_import_suffix_until_unique() {
        let local = local_with(&["lunch", "lunch-imported"]);
        let (merged, report) = merge(&local, vec![Menu::new("lunch", "Lunch")]);
        assert_eq!(merged.menus.len(), 3);
        assert_eq!(merged.menus[2].id, "lunch-imported-imported");
        assert_eq!(
            report.renamed,
            vec![("lunch".to_string(), "lunch-imported-imported".to_string())]
        );
    }

    #[test]
    fn missing_ids_fall_back_to_slugs() {
        let mut incoming = Menu::new("", "Weekend Brunch");
        incoming.items.push(MenuItem::new("", "Iced Tea"));
        let (merged, _) = merge(&local_with(&[]), vec![incoming]);
        assert_eq!(merged.menus[0].id, "weekend-brunch");
        assert_eq!(merged.menus[0].items[0].id, "iced-tea");
    }

    #[test]
    fn public_order_invariant_holds_after_merge() {
        let mut incoming = Menu::new("open", "Open");
        incoming.allow_public_order = true;
        let (merged, _) = merge(&local_with(&[]), vec![incoming]);
        assert!(merged.menus[0].public_id.is_some());

        let mut keeps_token = Menu::new("kept", "Kept");
        keeps_token.allow_public_order = true;
        keeps_token.public_id = Some("existing-token".to_string());
        let (merged, _) = merge(&local_with(&[]), vec![keeps_token]);
        assert_eq!(merged.menus[0].public_id.as_deref(), Some("existing-token"));
    }
}
