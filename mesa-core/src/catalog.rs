//! Menu catalog boundary
//!
//! The core consults the catalog exactly once per line item, at add
//! time, to snapshot `price_at_order`. Menu management itself lives
//! outside the core.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::repository::RepoResult;

/// Read-only price source for menu items
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    /// Current price of a menu item in the smallest currency unit, or
    /// None for an unknown item.
    async fn price_of(&self, menu_item_id: &str) -> RepoResult<Option<i64>>;
}

/// In-memory catalog backed by a concurrent map
///
/// Suitable for tests and for embedders that push the menu into the
/// core process instead of querying a remote catalog service.
#[derive(Debug, Default)]
pub struct StaticMenuCatalog {
    prices: DashMap<String, i64>,
}

impl StaticMenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, menu_item_id: impl Into<String>, price: i64) {
        self.prices.insert(menu_item_id.into(), price);
    }
}

#[async_trait]
impl MenuCatalog for StaticMenuCatalog {
    async fn price_of(&self, menu_item_id: &str) -> RepoResult<Option<i64>> {
        Ok(self.prices.get(menu_item_id).map(|p| *p))
    }
}
