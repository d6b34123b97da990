use crate::domain::{Asset, AssetId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 車両カタログポート
///
/// 予約コンテキストと車両カタログコンテキストの境界を維持する。
/// 予約コンテキストは料金・可用性・所在地を読み取るだけで、車両を変更しない。
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// IDで車両を取得する
    ///
    /// 存在しない場合は `None`。
    async fn find_asset(&self, asset_id: AssetId) -> Result<Option<Asset>>;
}
