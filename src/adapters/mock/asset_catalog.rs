use crate::domain::{Asset, AssetId};
use crate::ports::asset_catalog::{AssetCatalog as AssetCatalogTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory implementation of AssetCatalog
///
/// Assets are registered by tests (or seeded at startup) and can be
/// replaced to simulate catalog changes such as a new price or location.
pub struct AssetCatalog {
    assets: Mutex<HashMap<AssetId, Asset>>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self {
            assets: Mutex::new(HashMap::new()),
        }
    }

    /// Register or replace an asset
    pub fn add_asset(&self, asset: Asset) {
        self.assets.lock().unwrap().insert(asset.asset_id, asset);
    }

    /// Remove an asset, as if it had been retired from the catalog
    pub fn remove_asset(&self, asset_id: AssetId) {
        self.assets.lock().unwrap().remove(&asset_id);
    }

    /// Toggle availability of a registered asset
    pub fn set_available(&self, asset_id: AssetId, is_available: bool) {
        if let Some(asset) = self.assets.lock().unwrap().get_mut(&asset_id) {
            asset.is_available = is_available;
        }
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetCatalogTrait for AssetCatalog {
    async fn find_asset(&self, asset_id: AssetId) -> Result<Option<Asset>> {
        Ok(self.assets.lock().unwrap().get(&asset_id).cloned())
    }
}
