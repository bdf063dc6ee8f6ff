//! Domain types shared by the feed parser, the storefront client and the
//! run orchestrator.
//!
//! Everything here is created fresh for a run and dropped at the end of it;
//! only [`RunLogEntry`] ever reaches disk.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stock-keeping unit, the join key between the feed and the catalog.
///
/// Always trimmed and non-empty; construct with [`Sku::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Trim `raw` and wrap it, or `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for Sku {
    fn borrow(&self) -> &str {
        &self.0
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }
    };
}

numeric_id!(
    /// Platform identifier of a variant's stockable unit (distinct from the SKU).
    InventoryItemId
);
numeric_id!(
    /// Stock location / warehouse identifier, resolved once per run.
    LocationId
);
numeric_id!(
    /// Parent product of a catalog variant.
    ProductId
);

/// Non-negative stock quantity as carried by the feed and sent to the platform.
pub type Quantity = u32;

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// One accepted feed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockFeedEntry {
    pub sku: Sku,
    pub quantity: Quantity,
}

/// SKU → quantity mapping built once per run from the feed.
///
/// Read-only after construction; duplicate SKUs resolve to the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockFeedMap {
    entries: HashMap<Sku, Quantity>,
}

impl StockFeedMap {
    /// Build the map in feed order; a later entry for the same SKU replaces
    /// an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = StockFeedEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.insert(entry.sku, entry.quantity);
        }
        Self { entries: map }
    }

    pub fn get(&self, sku: &str) -> Option<Quantity> {
        self.entries.get(sku).copied()
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.entries.contains_key(sku)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sku, Quantity)> {
        self.entries.iter().map(|(sku, qty)| (sku, *qty))
    }
}

impl FromIterator<StockFeedEntry> for StockFeedMap {
    fn from_iter<I: IntoIterator<Item = StockFeedEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A sync-eligible variant flattened out of a tagged catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogVariant {
    /// `None` when the platform has no SKU (or only whitespace) for the variant.
    pub sku: Option<Sku>,
    pub inventory_item_id: InventoryItemId,
    /// Quantity the platform reported; `None` when it was not included.
    /// May be negative (oversold).
    pub current_quantity: Option<i64>,
    pub product_id: ProductId,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// What the reconciler decided for one catalog variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    /// Push the feed quantity to the platform.
    Update,
    /// The variant's SKU does not appear in the feed.
    SkipNoMatch,
    /// The variant has no SKU to match on.
    SkipNoSku,
    /// The platform already reports the feed quantity.
    SkipUnchanged,
}

impl SyncAction {
    pub fn is_update(self) -> bool {
        matches!(self, SyncAction::Update)
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Update => write!(f, "update"),
            SyncAction::SkipNoMatch => write!(f, "skip-no-match"),
            SyncAction::SkipNoSku => write!(f, "skip-no-sku"),
            SyncAction::SkipUnchanged => write!(f, "skip-unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncDecision {
    pub sku: Option<Sku>,
    pub inventory_item_id: InventoryItemId,
    pub current_quantity: Option<i64>,
    /// Feed quantity; present whenever the SKU matched the feed.
    pub target_quantity: Option<Quantity>,
    pub action: SyncAction,
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

/// Result column of a run log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOutcome {
    Ok,
    Error,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Ok => write!(f, "ok"),
            UpdateOutcome::Error => write!(f, "error"),
        }
    }
}

/// One update attempt, as written to the append-only run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub sku: Sku,
    pub inventory_item_id: InventoryItemId,
    pub quantity: Quantity,
    pub result: UpdateOutcome,
    /// Empty on success; truncated diagnostic detail on failure.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sku: &str, quantity: Quantity) -> StockFeedEntry {
        StockFeedEntry {
            sku: Sku::parse(sku).expect("sku"),
            quantity,
        }
    }

    #[test]
    fn sku_parse_trims_and_rejects_blank() {
        assert_eq!(Sku::parse("  ABC123 ").unwrap().as_str(), "ABC123");
        assert!(Sku::parse("").is_none());
        assert!(Sku::parse("   ").is_none());
    }

    #[test]
    fn feed_map_last_duplicate_wins() {
        let map = StockFeedMap::from_entries(vec![entry("A", 1), entry("B", 2), entry("A", 7)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A"), Some(7));
        assert_eq!(map.get("B"), Some(2));
    }

    #[test]
    fn feed_map_lookup_by_str() {
        let map: StockFeedMap = vec![entry("XYZ999", 0)].into_iter().collect();
        assert!(map.contains("XYZ999"));
        assert!(!map.contains("xyz999"));
        assert_eq!(map.get("XYZ999"), Some(0));
    }

    #[test]
    fn action_display_is_kebab_case() {
        assert_eq!(SyncAction::SkipNoMatch.to_string(), "skip-no-match");
        assert_eq!(
            serde_json::to_string(&SyncAction::SkipUnchanged).unwrap(),
            "\"skip-unchanged\""
        );
    }
}
