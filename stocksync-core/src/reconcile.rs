//! Feed ↔ catalog diff.
//!
//! Pure: no I/O, no clock. Decisions come out in catalog order.

use serde::Serialize;

use crate::config::UpdatePolicy;
use crate::types::{CatalogVariant, StockFeedMap, SyncAction, SyncDecision};

/// Decide, for every catalog variant, whether the platform needs the feed
/// quantity.
///
/// - no SKU → [`SyncAction::SkipNoSku`]
/// - SKU not in feed → [`SyncAction::SkipNoMatch`]
/// - [`UpdatePolicy::OnMismatch`] and a *known* current quantity equal to the
///   feed → [`SyncAction::SkipUnchanged`]
/// - otherwise → [`SyncAction::Update`]
pub fn reconcile(
    feed: &StockFeedMap,
    variants: &[CatalogVariant],
    policy: UpdatePolicy,
) -> Vec<SyncDecision> {
    variants
        .iter()
        .map(|variant| decide(feed, variant, policy))
        .collect()
}

fn decide(feed: &StockFeedMap, variant: &CatalogVariant, policy: UpdatePolicy) -> SyncDecision {
    let target = variant
        .sku
        .as_ref()
        .and_then(|sku| feed.get(sku.as_str()));

    let action = match (&variant.sku, target) {
        (None, _) => SyncAction::SkipNoSku,
        (Some(_), None) => SyncAction::SkipNoMatch,
        (Some(_), Some(target)) => match (policy, variant.current_quantity) {
            (UpdatePolicy::OnMismatch, Some(current)) if current == i64::from(target) => {
                SyncAction::SkipUnchanged
            }
            _ => SyncAction::Update,
        },
    };

    SyncDecision {
        sku: variant.sku.clone(),
        inventory_item_id: variant.inventory_item_id,
        current_quantity: variant.current_quantity,
        target_quantity: target,
        action,
    }
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Update decisions never attempted because the run was cancelled.
    pub pending: usize,
}

impl Tally {
    /// Count skips up front; updates are counted as they are applied.
    pub fn from_decisions(decisions: &[SyncDecision]) -> Self {
        Self {
            skipped: decisions.iter().filter(|d| !d.action.is_update()).count(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InventoryItemId, ProductId, Sku, StockFeedEntry};

    fn feed(pairs: &[(&str, u32)]) -> StockFeedMap {
        pairs
            .iter()
            .map(|(sku, quantity)| StockFeedEntry {
                sku: Sku::parse(sku).unwrap(),
                quantity: *quantity,
            })
            .collect()
    }

    fn variant(sku: &str, item: u64, current: Option<i64>) -> CatalogVariant {
        CatalogVariant {
            sku: Sku::parse(sku),
            inventory_item_id: InventoryItemId(item),
            current_quantity: current,
            product_id: ProductId(1),
        }
    }

    #[test]
    fn matched_sku_updates_unmatched_skips() {
        let feed = feed(&[("ABC123", 5), ("XYZ999", 0)]);
        let variants = vec![variant("ABC123", 111, Some(9)), variant("NOPE", 222, Some(3))];

        let decisions = reconcile(&feed, &variants, UpdatePolicy::OnMismatch);

        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].action, SyncAction::Update);
        assert_eq!(decisions[0].target_quantity, Some(5));
        assert_eq!(decisions[0].inventory_item_id, InventoryItemId(111));
        assert_eq!(decisions[1].action, SyncAction::SkipNoMatch);
        assert_eq!(decisions[1].target_quantity, None);

        let tally = Tally::from_decisions(&decisions);
        assert_eq!(tally.skipped, 1);
    }

    #[test]
    fn empty_sku_is_skip_no_sku() {
        let feed = feed(&[("ABC123", 5)]);
        let decisions = reconcile(&feed, &[variant("  ", 1, Some(0))], UpdatePolicy::Always);
        assert_eq!(decisions[0].action, SyncAction::SkipNoSku);
        assert!(decisions[0].sku.is_none());
    }

    #[test]
    fn equal_quantity_skipped_only_on_mismatch_policy() {
        let feed = feed(&[("A", 4)]);
        let variants = vec![variant("A", 1, Some(4))];

        let lazy = reconcile(&feed, &variants, UpdatePolicy::OnMismatch);
        assert_eq!(lazy[0].action, SyncAction::SkipUnchanged);

        let eager = reconcile(&feed, &variants, UpdatePolicy::Always);
        assert_eq!(eager[0].action, SyncAction::Update);
        assert_eq!(eager[0].target_quantity, Some(4));
    }

    #[test]
    fn unknown_current_quantity_always_updates() {
        let feed = feed(&[("A", 4)]);
        let decisions = reconcile(&feed, &[variant("A", 1, None)], UpdatePolicy::OnMismatch);
        assert_eq!(decisions[0].action, SyncAction::Update);
    }

    #[test]
    fn negative_current_quantity_differs_from_zero_target() {
        let feed = feed(&[("A", 0)]);
        let decisions = reconcile(&feed, &[variant("A", 1, Some(-2))], UpdatePolicy::OnMismatch);
        assert_eq!(decisions[0].action, SyncAction::Update);
        assert_eq!(decisions[0].target_quantity, Some(0));
    }

    #[test]
    fn order_follows_catalog() {
        let feed = feed(&[("A", 1), ("B", 2), ("C", 3)]);
        let variants = vec![
            variant("C", 3, None),
            variant("A", 1, None),
            variant("B", 2, None),
        ];
        let skus: Vec<String> = reconcile(&feed, &variants, UpdatePolicy::Always)
            .into_iter()
            .map(|d| d.sku.unwrap().to_string())
            .collect();
        assert_eq!(skus, ["C", "A", "B"]);
    }

    #[test]
    fn same_sku_on_two_variants_updates_both() {
        let feed = feed(&[("A", 6)]);
        let variants = vec![variant("A", 10, Some(1)), variant("A", 11, Some(2))];
        let decisions = reconcile(&feed, &variants, UpdatePolicy::OnMismatch);
        assert!(decisions.iter().all(|d| d.action == SyncAction::Update));
        assert_eq!(decisions[1].inventory_item_id, InventoryItemId(11));
    }
}
