use std::collections::BTreeMap;

use crate::domain::{
    AssetId, Booking, BookingEvent, BookingId, BookingStatus, Money, RentalPeriod, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// 永続化層のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// 同じ車両の有効な予約と期間が重なる（コミット時の制約違反）
    #[error("booking overlaps an existing booking for the same asset")]
    ScheduleConflict,

    /// 読み込んだ後に他の処理が同じ予約を更新した
    #[error("booking {} was modified concurrently", .0.value())]
    VersionMismatch(BookingId),

    /// 呼び出し側が指定した制限時間を超えた
    #[error("store call timed out")]
    Timeout,

    #[error("store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// 予約リポジトリポート
///
/// 予約レコードと監査イベントの永続化を抽象化する。
/// 予約は削除されない（キャンセル・完了は終端状態として残る）。
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 新しい予約を保存する
    ///
    /// 実装はコミット時に、同じ車両でスケジュールを占有している予約と
    /// 期間が重ならないことを保証しなければならない。
    /// 重なる場合は `StoreError::ScheduleConflict` を返し、何も保存しない。
    async fn insert(&self, booking: &Booking, event: &BookingEvent) -> Result<()>;

    /// 予約を更新する
    ///
    /// `booking.version - 1` が保存済みのバージョンと一致する場合のみ更新する
    /// （楽観的排他制御）。一致しない場合は `StoreError::VersionMismatch`。
    /// 期間の重なりについては `insert` と同じ制約が適用される。
    async fn update(&self, booking: &Booking, event: &BookingEvent) -> Result<()>;

    /// IDで予約を取得する
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// 車両のスケジュールを占有している予約のうち、期間が重なるものを検索する
    ///
    /// Cancelled / Completed / Returned の予約は含まない。
    async fn find_schedule_holders(
        &self,
        asset_id: AssetId,
        period: &RentalPeriod,
    ) -> Result<Vec<Booking>>;

    /// 利用者の予約を作成日時の降順で取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>>;

    /// すべての予約を作成日時の降順で取得する
    async fn find_all(&self) -> Result<Vec<Booking>>;

    /// ステータスごとの件数
    async fn count_by_status(&self) -> Result<BTreeMap<BookingStatus, u64>>;

    /// Cancelled 以外の予約の最終料金の合計
    async fn total_revenue(&self) -> Result<Money>;

    /// 予約の監査イベントを発生順に取得する
    async fn history(&self, booking_id: BookingId) -> Result<Vec<BookingEvent>>;
}
