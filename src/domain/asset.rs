use serde::{Deserialize, Serialize};

use super::{AssetId, GeoPoint, LocationSnapshot, Money};

/// 車両の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Car,
    Bike,
}

/// 車両カタログから受け取る車両情報（読み取り専用）
///
/// 予約コンテキストはこの値を参照するだけで、更新はしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: AssetId,
    pub kind: AssetKind,
    pub price_per_day: Money,
    /// 未設定の場合は既定の時間超過料金が使われる
    pub extra_charge_per_hour: Option<Money>,
    pub is_available: bool,
    pub is_active: bool,
    pub pickup_location: Option<GeoPoint>,
    pub address: String,
}

impl Asset {
    /// 新規予約を受け付けられるか
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_available
    }

    /// 予約に保存する受け取り場所のスナップショット
    pub fn location_snapshot(&self) -> LocationSnapshot {
        LocationSnapshot {
            point: self.pickup_location,
            address: self.address.clone(),
        }
    }
}
