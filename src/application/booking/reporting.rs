use crate::domain::{Booking, BookingEvent, BookingId, BookingStatus, Identity, Money};
use serde::Serialize;
use std::collections::BTreeMap;

use super::booking_service::{ServiceDependencies, load_booking, within_store_timeout};
use super::errors::{BookingApplicationError, Result};

/// 管理画面向けの予約集計
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total_bookings: u64,
    pub status_counts: BTreeMap<BookingStatus, u64>,
    /// Cancelled 以外の予約の最終料金の合計
    pub total_revenue: Money,
}

/// 予約を1件取得する（本人または管理者）
pub async fn get_booking(
    deps: &ServiceDependencies,
    caller: &Identity,
    booking_id: BookingId,
) -> Result<Booking> {
    let booking = load_booking(deps, booking_id).await?;

    if !caller.can_access(booking.user_id) {
        return Err(BookingApplicationError::Unauthorized);
    }

    Ok(booking)
}

/// 呼び出し元の予約一覧（新しい順）
pub async fn list_my_bookings(deps: &ServiceDependencies, caller: &Identity) -> Result<Vec<Booking>> {
    within_store_timeout(deps, deps.booking_repository.find_by_user(caller.user_id)).await
}

/// すべての予約一覧（管理者のみ、新しい順）
pub async fn list_all_bookings(
    deps: &ServiceDependencies,
    caller: &Identity,
) -> Result<Vec<Booking>> {
    if !caller.is_admin() {
        return Err(BookingApplicationError::Unauthorized);
    }

    within_store_timeout(deps, deps.booking_repository.find_all()).await
}

/// 予約の監査イベント（発生順、本人または管理者）
pub async fn booking_history(
    deps: &ServiceDependencies,
    caller: &Identity,
    booking_id: BookingId,
) -> Result<Vec<BookingEvent>> {
    get_booking(deps, caller, booking_id).await?;

    within_store_timeout(deps, deps.booking_repository.history(booking_id)).await
}

/// ステータス別件数と売上合計（管理者のみ）
pub async fn booking_stats(deps: &ServiceDependencies, caller: &Identity) -> Result<BookingStats> {
    if !caller.is_admin() {
        return Err(BookingApplicationError::Unauthorized);
    }

    let (status_counts, total_revenue) = futures::future::try_join(
        within_store_timeout(deps, deps.booking_repository.count_by_status()),
        within_store_timeout(deps, deps.booking_repository.total_revenue()),
    )
    .await?;

    Ok(BookingStats {
        total_bookings: status_counts.values().sum(),
        status_counts,
        total_revenue,
    })
}
