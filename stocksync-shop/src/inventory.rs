//! Per-variant stock writes.
//!
//! Two calls per variant:
//! 1. `inventory_levels/connect.json`: idempotent; makes sure the item is
//!    stocked at the location. Failures are logged and ignored.
//! 2. `inventory_levels/set.json`: authoritative absolute `available`.

use serde_json::json;
use stocksync_core::{InventoryItemId, LocationId, Quantity, SyncDecision};

use crate::client::{truncate_detail, ShopClient};

/// Outcome of one variant update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Ok,
    /// `detail` is the truncated response body or transport error.
    Failed { detail: String },
}

impl UpdateResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, UpdateResult::Ok)
    }
}

/// Applies quantities to one location. The location is fixed for the
/// updater's lifetime.
pub struct InventoryUpdater<'a> {
    client: ShopClient<'a>,
    location: LocationId,
    connect_first: bool,
}

impl<'a> InventoryUpdater<'a> {
    pub fn new(client: ShopClient<'a>, location: LocationId, connect_first: bool) -> Self {
        Self {
            client,
            location,
            connect_first,
        }
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    /// Apply an `update` decision. Returns `None` for any other action.
    pub fn apply(&self, decision: &SyncDecision) -> Option<UpdateResult> {
        if !decision.action.is_update() {
            return None;
        }
        let quantity = decision.target_quantity?;
        if self.connect_first {
            self.connect(decision.inventory_item_id);
        }
        Some(self.set(decision.inventory_item_id, quantity))
    }

    /// Associate the item with the location. Never fails the update.
    pub fn connect(&self, item: InventoryItemId) {
        let url = match self.client.endpoint("inventory_levels/connect.json") {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, "connect skipped");
                return;
            }
        };
        let body = json!({
            "location_id": self.location.0,
            "inventory_item_id": item.0,
        });
        match self.client.post_json(url.as_str(), body) {
            Ok(response) if response.is_success() => {}
            // Already-connected items answer 422; that is the expected case.
            Ok(response) => tracing::debug!(
                inventory_item_id = %item,
                status = response.status,
                body = %truncate_detail(&response.body),
                "connect call not accepted"
            ),
            Err(err) => tracing::warn!(inventory_item_id = %item, error = %err, "connect call failed"),
        }
    }

    /// Set the absolute available quantity.
    pub fn set(&self, item: InventoryItemId, quantity: Quantity) -> UpdateResult {
        let url = match self.client.endpoint("inventory_levels/set.json") {
            Ok(url) => url,
            Err(err) => {
                return UpdateResult::Failed {
                    detail: err.to_string(),
                }
            }
        };
        let body = json!({
            "location_id": self.location.0,
            "inventory_item_id": item.0,
            "available": quantity,
        });
        match self.client.post_json(url.as_str(), body) {
            Ok(response) if response.is_success() => UpdateResult::Ok,
            Ok(response) => UpdateResult::Failed {
                detail: format!(
                    "HTTP {}: {}",
                    response.status,
                    truncate_detail(&response.body)
                ),
            },
            Err(err) => UpdateResult::Failed {
                detail: truncate_detail(&err.to_string()),
            },
        }
    }
}
