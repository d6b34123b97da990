use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AssetId, Booking, BookingId, BookingStatus, GeoPoint, Money,
    commands::{CreateBooking, UpdateBookingDates, UpdateBookingStatus},
};

/// POST /bookings のリクエスト
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub asset_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl CreateBookingRequest {
    pub fn to_command(&self) -> CreateBooking {
        CreateBooking {
            asset_id: AssetId::from_uuid(self.asset_id),
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// PATCH /bookings/:id/status のリクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    /// 実際の返却時刻（精算時のみ）。省略時はサーバーの現在時刻。
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
}

impl UpdateStatusRequest {
    pub fn to_command(&self, booking_id: Uuid) -> UpdateBookingStatus {
        UpdateBookingStatus {
            booking_id: BookingId::from_uuid(booking_id),
            requested: self.status,
            returned_at: self.returned_at,
        }
    }
}

/// PUT /bookings/:id のリクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateDatesRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl UpdateDatesRequest {
    pub fn to_command(&self, booking_id: Uuid) -> UpdateBookingDates {
        UpdateBookingDates {
            booking_id: BookingId::from_uuid(booking_id),
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// GET /bookings/conflicts のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ConflictQuery {
    pub asset_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// 判定から除く予約（期間変更中の自分自身）
    pub exclude: Option<Uuid>,
}

/// 重複チェックのレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ConflictResponse {
    pub has_conflict: bool,
}

/// 予約レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub base_price: Money,
    pub penalty_amount: Money,
    pub refund_amount: Money,
    pub final_price: Money,
    pub status: BookingStatus,
    pub pickup_location: Option<GeoPoint>,
    pub pickup_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.booking_id.value(),
            user_id: booking.user_id.value(),
            asset_id: booking.asset_id.value(),
            start_date: booking.period.start(),
            end_date: booking.period.end(),
            actual_return_date: booking.actual_return(),
            base_price: booking.base_price,
            penalty_amount: booking.penalty_amount(),
            refund_amount: booking.refund_amount(),
            final_price: booking.final_price(),
            status: booking.status,
            pickup_location: booking.location.point,
            pickup_address: booking.location.address,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error_type.into(),
            message: message.into(),
        }
    }
}
