use chrono::{DateTime, Utc};
use thiserror::Error;

use super::BookingStatus;

/// 料金計算のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// 終了日時が開始日時以前
    #[error("end ({end}) must be after start ({start})")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// 予約の状態遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// 車両が予約を受け付けていない（is_active / is_available が false）
    #[error("asset is not currently available")]
    AssetUnavailable,

    /// 現在のステータスから要求されたステータスへは遷移できない
    #[error("cannot move booking from {current} to {requested}")]
    InvalidTransition {
        current: BookingStatus,
        requested: BookingStatus,
    },

    #[error(transparent)]
    Pricing(#[from] PricingError),
}
