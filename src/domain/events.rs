use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AssetId, BookingId, BookingStatus, Money, RentalPeriod, UserId};

/// イベント：予約が作成された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub period: RentalPeriod,
    pub base_price: Money,
    pub created_at: DateTime<Utc>,
}

/// イベント：予約のステータスが進んだ（料金計算を伴わない単純な変更）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAdvanced {
    pub booking_id: BookingId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub advanced_at: DateTime<Utc>,
}

/// イベント：予約がキャンセルされた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub booking_id: BookingId,
    pub previous_status: BookingStatus,
    pub cancelled_at: DateTime<Utc>,
}

/// イベント：返却され精算された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSettled {
    pub booking_id: BookingId,
    pub previous_status: BookingStatus,
    /// 要求されたステータス（Returned または Completed）
    pub requested: BookingStatus,
    pub actual_return: DateTime<Utc>,
    pub penalty: Money,
    pub refund: Money,
    pub final_price: Money,
    pub settled_at: DateTime<Utc>,
}

/// イベント：予約期間が変更された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRescheduled {
    pub booking_id: BookingId,
    pub old_period: RentalPeriod,
    pub new_period: RentalPeriod,
    pub old_base_price: Money,
    pub new_base_price: Money,
    pub rescheduled_at: DateTime<Utc>,
}

/// ドメインイベント統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BookingCreated(BookingCreated),
    BookingAdvanced(BookingAdvanced),
    BookingCancelled(BookingCancelled),
    BookingSettled(BookingSettled),
    BookingRescheduled(BookingRescheduled),
}

impl BookingEvent {
    pub fn booking_id(&self) -> BookingId {
        match self {
            BookingEvent::BookingCreated(e) => e.booking_id,
            BookingEvent::BookingAdvanced(e) => e.booking_id,
            BookingEvent::BookingCancelled(e) => e.booking_id,
            BookingEvent::BookingSettled(e) => e.booking_id,
            BookingEvent::BookingRescheduled(e) => e.booking_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated(_) => "BookingCreated",
            BookingEvent::BookingAdvanced(_) => "BookingAdvanced",
            BookingEvent::BookingCancelled(_) => "BookingCancelled",
            BookingEvent::BookingSettled(_) => "BookingSettled",
            BookingEvent::BookingRescheduled(_) => "BookingRescheduled",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::BookingCreated(e) => e.created_at,
            BookingEvent::BookingAdvanced(e) => e.advanced_at,
            BookingEvent::BookingCancelled(e) => e.cancelled_at,
            BookingEvent::BookingSettled(e) => e.settled_at,
            BookingEvent::BookingRescheduled(e) => e.rescheduled_at,
        }
    }
}
