use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AssetId, BookingId, BookingStatus};

/// コマンド：予約を作成する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub asset_id: AssetId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// コマンド：予約のステータスを変更する（管理者）
///
/// Returned / Completed は精算として扱われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookingStatus {
    pub booking_id: BookingId,
    pub requested: BookingStatus,
    /// 実際の返却時刻。省略時は処理時刻。
    pub returned_at: Option<DateTime<Utc>>,
}

/// コマンド：予約をキャンセルする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub booking_id: BookingId,
}

/// コマンド：予約期間を変更する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookingDates {
    pub booking_id: BookingId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
