//! Tagged catalog products → sync-eligible variants.

use serde::Deserialize;
use stocksync_core::{
    CatalogConfig, CatalogVariant, InventoryItemId, ProductId, Sku, TagMatch,
};

use crate::client::ShopClient;
use crate::error::ShopError;
use crate::pagination::ProductPages;

/// Platform maximum for `limit`.
pub const PAGE_LIMIT: u32 = 250;

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsPage {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: u64,
    /// Comma-separated tag list as the platform returns it.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_item_id: Option<u64>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

impl Product {
    /// Exact, case-sensitive membership of `tag` in the trimmed tag tokens.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .any(|t| t.trim() == tag)
    }
}

/// First-page URL for the configured selection strategy.
pub fn first_page_url(client: &ShopClient<'_>, catalog: &CatalogConfig) -> Result<String, ShopError> {
    let mut url = client.endpoint("products.json")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("limit", &PAGE_LIMIT.to_string());
        if catalog.tag_match == TagMatch::Server {
            query.append_pair("tag", &catalog.tag);
        }
    }
    Ok(url.into())
}

/// Fetch every product carrying the configured tag and flatten its variants,
/// in catalog order.
pub fn fetch_tagged_variants(
    client: &ShopClient<'_>,
    catalog: &CatalogConfig,
) -> Result<Vec<CatalogVariant>, ShopError> {
    tracing::info!(tag = %catalog.tag, "fetching tagged catalog products");

    let mut pages = ProductPages::new(*client, first_page_url(client, catalog)?);
    let mut products = Vec::new();
    for page in pages.by_ref() {
        let page = page?;
        match catalog.tag_match {
            TagMatch::Server => products.extend(page),
            TagMatch::Client => products.extend(page.into_iter().filter(|p| p.has_tag(&catalog.tag))),
        }
    }

    let variants = flatten(&products);
    tracing::info!(
        products = products.len(),
        variants = variants.len(),
        pages = pages.requests(),
        "catalog products fetched"
    );
    Ok(variants)
}

/// One [`CatalogVariant`] per platform variant with an inventory item.
pub fn flatten(products: &[Product]) -> Vec<CatalogVariant> {
    let mut out = Vec::new();
    for product in products {
        for variant in &product.variants {
            let Some(item) = variant.inventory_item_id else {
                tracing::debug!(
                    product_id = product.id,
                    variant_id = ?variant.id,
                    "variant has no inventory item; ignored"
                );
                continue;
            };
            out.push(CatalogVariant {
                sku: variant.sku.as_deref().and_then(Sku::parse),
                inventory_item_id: InventoryItemId(item),
                current_quantity: variant.inventory_quantity,
                product_id: ProductId(product.id),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn product(tags: Option<&str>) -> Product {
        Product {
            id: 1,
            tags: tags.map(str::to_owned),
            variants: vec![],
        }
    }

    #[rstest]
    #[case(Some("Manuel"), true)]
    #[case(Some("Promo, Manuel ,Summer"), true)]
    #[case(Some("manuel"), false)]
    #[case(Some("Manuel2, Manu"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn tag_membership(#[case] tags: Option<&str>, #[case] expected: bool) {
        assert_eq!(product(tags).has_tag("Manuel"), expected);
    }

    #[test]
    fn flatten_carries_fields_and_drops_itemless_variants() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[
                {"id": 10, "tags": "Manuel", "variants": [
                    {"id": 1, "sku": " ABC123 ", "inventory_item_id": 111, "inventory_quantity": 9},
                    {"id": 2, "sku": null, "inventory_item_id": 112},
                    {"id": 3, "sku": "NOITEM"}
                ]},
                {"id": 20, "variants": [
                    {"id": 4, "sku": "", "inventory_item_id": 222, "inventory_quantity": -1}
                ]}
            ]"#,
        )
        .unwrap();

        let variants = flatten(&products);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].sku.as_ref().unwrap().as_str(), "ABC123");
        assert_eq!(variants[0].inventory_item_id, InventoryItemId(111));
        assert_eq!(variants[0].current_quantity, Some(9));
        assert_eq!(variants[0].product_id, ProductId(10));
        assert!(variants[1].sku.is_none());
        assert_eq!(variants[1].current_quantity, None);
        assert!(variants[2].sku.is_none());
        assert_eq!(variants[2].current_quantity, Some(-1));
    }
}
