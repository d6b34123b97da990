use super::{AssetId, Booking, BookingId, RentalPeriod};

/// 候補の中から、指定期間と重なる予約を探す
///
/// 対象になるのは同じ車両で、スケジュールを占有しているステータスの予約のみ。
/// `exclude` に指定した予約（期間変更中の自分自身）は無視する。
pub fn find_conflict<'a>(
    candidates: impl IntoIterator<Item = &'a Booking>,
    asset_id: AssetId,
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> Option<&'a Booking> {
    candidates.into_iter().find(|booking| {
        booking.asset_id == asset_id
            && booking.status.holds_schedule()
            && Some(booking.booking_id) != exclude
            && booking.period.overlaps(period)
    })
}

/// 指定期間と重なる予約が存在するか
pub fn has_conflict<'a>(
    candidates: impl IntoIterator<Item = &'a Booking>,
    asset_id: AssetId,
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> bool {
    find_conflict(candidates, asset_id, period, exclude).is_some()
}
