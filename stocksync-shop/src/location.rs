//! Target stock location.

use serde::Deserialize;
use stocksync_core::{LocationId, LocationTarget};

use crate::client::ShopClient;
use crate::error::ShopError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Location {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LocationsPage {
    #[serde(default)]
    locations: Vec<Location>,
}

/// All locations of the shop, in platform order.
pub fn list_locations(client: &ShopClient<'_>) -> Result<Vec<Location>, ShopError> {
    let url = client.endpoint("locations.json")?;
    let (page, _): (LocationsPage, _) = client.get_json(url.as_str(), "locations.json")?;
    Ok(page.locations)
}

/// First location whose name equals `name`, ignoring case and surrounding
/// whitespace.
pub fn select_location(locations: &[Location], name: &str) -> Option<LocationId> {
    let wanted = name.trim().to_lowercase();
    locations
        .iter()
        .find(|loc| loc.name.trim().to_lowercase() == wanted)
        .map(|loc| LocationId(loc.id))
}

/// Resolve the configured target to a location id.
///
/// An explicit id is returned as-is without a request. A name is looked up
/// once; no match is [`ShopError::LocationNotFound`].
pub fn resolve_location(
    client: &ShopClient<'_>,
    target: &LocationTarget,
) -> Result<LocationId, ShopError> {
    let name = match target {
        LocationTarget::Id(id) => {
            tracing::info!(location_id = %id, "using configured stock location");
            return Ok(*id);
        }
        LocationTarget::Name(name) => name,
    };

    let locations = list_locations(client)?;
    match select_location(&locations, name) {
        Some(id) => {
            tracing::info!(location_id = %id, name = %name, "stock location resolved");
            Ok(id)
        }
        None => Err(ShopError::LocationNotFound {
            name: name.clone(),
            available: if locations.is_empty() {
                "none".to_string()
            } else {
                locations
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<Location> {
        vec![
            Location {
                id: 1,
                name: "Warehouse".into(),
            },
            Location {
                id: 2,
                name: "Adopt1Toy".into(),
            },
            Location {
                id: 3,
                name: "adopt1toy".into(),
            },
        ]
    }

    #[test]
    fn name_match_is_case_insensitive_and_first_wins() {
        assert_eq!(select_location(&locations(), "adopt1toy"), Some(LocationId(2)));
        assert_eq!(select_location(&locations(), " WAREHOUSE "), Some(LocationId(1)));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(select_location(&locations(), "Depot"), None);
        assert_eq!(select_location(&[], "Depot"), None);
    }
}
