use crate::domain::{BookingError, BookingStatus, PricingError};
use crate::ports::StoreError;
use thiserror::Error;

/// 予約管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// 終了日時が開始日時以前
    #[error("End date must be after start date")]
    InvalidInterval,

    /// プロフィール登録（オンボーディング）が未完了
    #[error("Please complete your onboarding before booking")]
    OnboardingRequired,

    /// 車両が存在しない
    #[error("Asset not found")]
    AssetNotFound,

    /// 予約が存在しない
    #[error("Booking not found")]
    BookingNotFound,

    /// 車両が有効でない、または貸出可能でない
    #[error("Asset is not currently available")]
    AssetUnavailable,

    /// 同じ車両の有効な予約と期間が重なる
    #[error("Asset is already booked for these dates")]
    ScheduleConflict,

    /// 現在のステータスからは要求された遷移ができない
    #[error("Cannot move booking from {current} to {requested}")]
    InvalidTransition {
        current: BookingStatus,
        requested: BookingStatus,
    },

    /// 本人または管理者ではない
    #[error("Not authorized")]
    Unauthorized,

    /// 永続化層のエラー（タイムアウトを含む）
    #[error("Storage error")]
    StorageError(#[source] StoreError),

    /// 車両カタログのエラー
    #[error("Asset catalog error")]
    AssetCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 認証基盤のエラー
    #[error("Identity provider error")]
    IdentityProviderError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for BookingApplicationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ScheduleConflict => BookingApplicationError::ScheduleConflict,
            other => BookingApplicationError::StorageError(other),
        }
    }
}

impl From<PricingError> for BookingApplicationError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidInterval { .. } => BookingApplicationError::InvalidInterval,
        }
    }
}

impl From<BookingError> for BookingApplicationError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::AssetUnavailable => BookingApplicationError::AssetUnavailable,
            BookingError::InvalidTransition { current, requested } => {
                BookingApplicationError::InvalidTransition { current, requested }
            }
            BookingError::Pricing(e) => e.into(),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
