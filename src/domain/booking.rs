use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Asset, AssetId, BookingAdvanced, BookingCancelled, BookingCreated, BookingError, BookingEvent,
    BookingId, BookingRescheduled, BookingSettled, LocationSnapshot, Money, RentalPeriod,
    SettlementAdjustment, UserId, pricing,
};

// ============================================================================
// ステータス
// ============================================================================

/// 予約ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    PickedUp,
    Active,
    Returned,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::PickedUp,
        BookingStatus::Active,
        BookingStatus::Returned,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// 車両のスケジュールを占有しないステータス
    pub const RELEASED: [BookingStatus; 3] = [
        BookingStatus::Cancelled,
        BookingStatus::Completed,
        BookingStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::PickedUp => "picked_up",
            BookingStatus::Active => "active",
            BookingStatus::Returned => "returned",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// これ以上どのフィールドも変更できない終端状態
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// 重複チェックの対象になるか（車両の期間を占有しているか）
    pub fn holds_schedule(&self) -> bool {
        !Self::RELEASED.contains(self)
    }

    /// 車両の引き渡し前のみキャンセル可能
    pub fn is_cancellable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    /// 引き渡しまでの進行段階。進行の対象外のステータスは `None`。
    fn fulfillment_stage(&self) -> Option<u8> {
        match self {
            BookingStatus::Pending => Some(0),
            BookingStatus::Approved => Some(1),
            BookingStatus::PickedUp => Some(2),
            BookingStatus::Active => Some(3),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid booking status: {}", s))
    }
}

// ============================================================================
// 集約
// ============================================================================

/// 返却時の精算結果
///
/// 不変条件：精算結果はステータスが Completed の予約にだけ存在する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub actual_return: DateTime<Utc>,
    pub penalty: Money,
    pub refund: Money,
    pub final_price: Money,
}

/// Booking集約 - 1台の車両の1回の予約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    // 識別子
    pub booking_id: BookingId,

    // 他の集約への参照（IDのみ）
    pub user_id: UserId,
    pub asset_id: AssetId,

    // 予約管理の責務
    pub period: RentalPeriod,
    pub base_price: Money,
    pub status: BookingStatus,
    pub settlement: Option<Settlement>,
    pub location: LocationSnapshot,

    // 監査情報
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn actual_return(&self) -> Option<DateTime<Utc>> {
        self.settlement.map(|s| s.actual_return)
    }

    pub fn penalty_amount(&self) -> Money {
        self.settlement.map_or(Money::ZERO, |s| s.penalty)
    }

    pub fn refund_amount(&self) -> Money {
        self.settlement.map_or(Money::ZERO, |s| s.refund)
    }

    /// 精算前は基本料金がそのまま最終料金
    pub fn final_price(&self) -> Money {
        self.settlement.map_or(self.base_price, |s| s.final_price)
    }

    fn invalid(&self, requested: BookingStatus) -> BookingError {
        BookingError::InvalidTransition {
            current: self.status,
            requested,
        }
    }

    fn next_revision(&self, status: BookingStatus, at: DateTime<Utc>) -> Booking {
        Booking {
            status,
            version: self.version + 1,
            updated_at: at,
            ..self.clone()
        }
    }
}

// ============================================================================
// 遷移
// ============================================================================

/// 予約に対する状態遷移
///
/// Returned と Completed の要求はどちらも `Settle` にまとめられ、
/// 精算は1回だけ行われて最終ステータスは必ず Completed になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 料金計算を伴わないステータス変更（Approved / PickedUp / Active）
    Advance(BookingStatus),
    Cancel,
    Settle {
        requested: BookingStatus,
        returned_at: DateTime<Utc>,
    },
}

impl Transition {
    /// 要求されたステータスを遷移に変換する。Pending へ戻す遷移は存在しない。
    pub fn from_requested(requested: BookingStatus, returned_at: DateTime<Utc>) -> Option<Self> {
        match requested {
            BookingStatus::Pending => None,
            BookingStatus::Approved | BookingStatus::PickedUp | BookingStatus::Active => {
                Some(Transition::Advance(requested))
            }
            BookingStatus::Cancelled => Some(Transition::Cancel),
            BookingStatus::Returned | BookingStatus::Completed => Some(Transition::Settle {
                requested,
                returned_at,
            }),
        }
    }
}

/// 精算に使う料金条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementTerms {
    pub price_per_day: Money,
    pub extra_charge_per_hour: Money,
}

impl SettlementTerms {
    /// 車両の料金設定から精算条件を作る。時間超過料金が未設定なら `default_rate`。
    pub fn for_asset(asset: &Asset, default_rate: Money) -> Self {
        Self {
            price_per_day: asset.price_per_day,
            extra_charge_per_hour: pricing::effective_hourly_rate(
                asset.extra_charge_per_hour,
                default_rate,
            ),
        }
    }

    /// 精算を伴わない遷移に渡す空の条件
    pub fn unpriced() -> Self {
        Self {
            price_per_day: Money::ZERO,
            extra_charge_per_hour: Money::ZERO,
        }
    }
}

/// 純粋関数：予約を作成する
///
/// ビジネスルール：
/// - 車両が有効かつ貸出可能であること
/// - 基本料金は課金日数 × 1日あたりの料金
/// - 受け取り場所は作成時点の値をコピーする
/// - 状態はPending
///
/// 副作用なし。新しいBookingとイベントを返す。
pub fn create_booking(
    user_id: UserId,
    asset: &Asset,
    period: RentalPeriod,
    created_at: DateTime<Utc>,
) -> Result<(Booking, BookingCreated), BookingError> {
    if !asset.is_bookable() {
        return Err(BookingError::AssetUnavailable);
    }

    let booking_id = BookingId::new();
    let base_price = pricing::base_price_for(&period, asset.price_per_day);

    let booking = Booking {
        booking_id,
        user_id,
        asset_id: asset.asset_id,
        period,
        base_price,
        status: BookingStatus::Pending,
        settlement: None,
        location: asset.location_snapshot(),
        version: 1,
        created_at,
        updated_at: created_at,
    };

    let event = BookingCreated {
        booking_id,
        user_id,
        asset_id: asset.asset_id,
        period,
        base_price,
        created_at,
    };

    Ok((booking, event))
}

/// 純粋関数：ステータスを進める（料金計算なし）
///
/// ビジネスルール：
/// - 対象は Approved / PickedUp / Active のみ
/// - 現在より先の段階へのみ進める（段階の飛び越しは可）
/// - 終端状態・Returned からは進められない
pub fn advance_booking(
    booking: &Booking,
    target: BookingStatus,
    advanced_at: DateTime<Utc>,
) -> Result<(Booking, BookingAdvanced), BookingError> {
    let (Some(current), Some(next)) = (
        booking.status.fulfillment_stage(),
        target.fulfillment_stage(),
    ) else {
        return Err(booking.invalid(target));
    };

    if next <= current {
        return Err(booking.invalid(target));
    }

    let new_booking = booking.next_revision(target, advanced_at);

    let event = BookingAdvanced {
        booking_id: booking.booking_id,
        from: booking.status,
        to: target,
        advanced_at,
    };

    Ok((new_booking, event))
}

/// 純粋関数：予約をキャンセルする
///
/// ビジネスルール：
/// - Pending / Approved のみキャンセル可能
/// - 引き渡し後（PickedUp, Active）や返却後、キャンセル済みは不可
pub fn cancel_booking(
    booking: &Booking,
    cancelled_at: DateTime<Utc>,
) -> Result<(Booking, BookingCancelled), BookingError> {
    if !booking.status.is_cancellable() {
        return Err(booking.invalid(BookingStatus::Cancelled));
    }

    let new_booking = booking.next_revision(BookingStatus::Cancelled, cancelled_at);

    let event = BookingCancelled {
        booking_id: booking.booking_id,
        previous_status: booking.status,
        cancelled_at,
    };

    Ok((new_booking, event))
}

/// 純粋関数：返却を受け付けて精算する
///
/// ビジネスルール：
/// - Cancelled / Completed 以外から可能
/// - 延滞料金・返金を計算し、最終料金は0未満にならない
/// - actual_return はここで1回だけ設定される
/// - 最終ステータスは常に Completed
pub fn settle_booking(
    booking: &Booking,
    requested: BookingStatus,
    returned_at: DateTime<Utc>,
    terms: SettlementTerms,
    settled_at: DateTime<Utc>,
) -> Result<(Booking, BookingSettled), BookingError> {
    if booking.status.is_terminal() {
        return Err(booking.invalid(requested));
    }

    let adjustment: SettlementAdjustment = pricing::compute_settlement(
        booking.period.end(),
        returned_at,
        terms.price_per_day,
        terms.extra_charge_per_hour,
    );
    let final_price = pricing::final_price(booking.base_price, adjustment);

    let settlement = Settlement {
        actual_return: returned_at,
        penalty: adjustment.penalty,
        refund: adjustment.refund,
        final_price,
    };

    let new_booking = Booking {
        settlement: Some(settlement),
        ..booking.next_revision(BookingStatus::Completed, settled_at)
    };

    let event = BookingSettled {
        booking_id: booking.booking_id,
        previous_status: booking.status,
        requested,
        actual_return: returned_at,
        penalty: adjustment.penalty,
        refund: adjustment.refund,
        final_price,
        settled_at,
    };

    Ok((new_booking, event))
}

/// 純粋関数：予約期間を変更する
///
/// ビジネスルール：
/// - Pending のみ変更可能
/// - 基本料金を新しい期間で再計算する
///
/// 重複チェックは呼び出し側（アプリケーション層）の責務。
pub fn reschedule_booking(
    booking: &Booking,
    new_period: RentalPeriod,
    price_per_day: Money,
    rescheduled_at: DateTime<Utc>,
) -> Result<(Booking, BookingRescheduled), BookingError> {
    if booking.status != BookingStatus::Pending {
        return Err(booking.invalid(BookingStatus::Pending));
    }

    let new_base_price = pricing::base_price_for(&new_period, price_per_day);

    let new_booking = Booking {
        period: new_period,
        base_price: new_base_price,
        ..booking.next_revision(BookingStatus::Pending, rescheduled_at)
    };

    let event = BookingRescheduled {
        booking_id: booking.booking_id,
        old_period: booking.period,
        new_period,
        old_base_price: booking.base_price,
        new_base_price,
        rescheduled_at,
    };

    Ok((new_booking, event))
}

/// 遷移を適用する
///
/// `terms` は精算のときだけ使われる。
pub fn apply_transition(
    booking: &Booking,
    transition: Transition,
    terms: SettlementTerms,
    at: DateTime<Utc>,
) -> Result<(Booking, BookingEvent), BookingError> {
    match transition {
        Transition::Advance(target) => advance_booking(booking, target, at)
            .map(|(b, e)| (b, BookingEvent::BookingAdvanced(e))),
        Transition::Cancel => {
            cancel_booking(booking, at).map(|(b, e)| (b, BookingEvent::BookingCancelled(e)))
        }
        Transition::Settle {
            requested,
            returned_at,
        } => settle_booking(booking, requested, returned_at, terms, at)
            .map(|(b, e)| (b, BookingEvent::BookingSettled(e))),
    }
}
