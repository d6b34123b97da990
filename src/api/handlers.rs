use crate::application::booking::{
    self as service, BookingApplicationError, BookingStats, ServiceDependencies,
};
use crate::domain::{
    AssetId, BookingEvent, BookingId, Identity, UserId,
    commands::CancelBooking,
};
use axum::{
    Json, async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BookingResponse, ConflictQuery, ConflictResponse, CreateBookingRequest,
        UpdateDatesRequest, UpdateStatusRequest,
    },
};

/// 呼び出し元の利用者IDを運ぶヘッダー
pub const CALLER_HEADER: &str = "x-user-id";

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Caller
// ============================================================================

/// 認証済みの呼び出し元
///
/// 上流の認証基盤が `x-user-id` ヘッダーに利用者IDを設定する前提。
/// ヘッダーがない、または認証基盤に登録のない利用者は 401 を返す。
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or(ApiError::Unauthenticated)?;

        match service::resolve_caller(&state.service_deps, user_id).await {
            Ok(identity) => Ok(Caller(identity)),
            Err(BookingApplicationError::Unauthorized) => Err(ApiError::Unauthenticated),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /bookings - 新しい予約を作成
///
/// 強制されるビジネスルール:
/// - オンボーディングが完了していること
/// - 車両が有効かつ貸出可能であること
/// - 同じ車両の有効な予約と期間が重ならないこと
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = service::create_booking(&state.service_deps, &caller, req.to_command()).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// PATCH /bookings/:id/status - ステータスを変更（管理者）
///
/// returned / completed は精算を行い、最終ステータスは completed になる。
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking =
        service::update_status(&state.service_deps, &caller, req.to_command(booking_id)).await?;

    Ok(Json(BookingResponse::from(booking)))
}

/// DELETE /bookings/:id - 予約をキャンセル（本人または管理者）
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let cmd = CancelBooking {
        booking_id: BookingId::from_uuid(booking_id),
    };
    let booking = service::cancel_booking(&state.service_deps, &caller, cmd).await?;

    Ok(Json(BookingResponse::from(booking)))
}

/// PUT /bookings/:id - 予約期間を変更（本人のみ、Pending のみ）
pub async fn update_booking_dates(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateDatesRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking =
        service::update_booking_dates(&state.service_deps, &caller, req.to_command(booking_id))
            .await?;

    Ok(Json(BookingResponse::from(booking)))
}

// ============================================================================
// Query handlers
// ============================================================================

/// GET /bookings - すべての予約（管理者）
pub async fn list_all_bookings(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = service::list_all_bookings(&state.service_deps, &caller).await?;

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// GET /bookings/mine - 呼び出し元の予約
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = service::list_my_bookings(&state.service_deps, &caller).await?;

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// GET /bookings/:id - 予約詳細（本人または管理者）
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking =
        service::get_booking(&state.service_deps, &caller, BookingId::from_uuid(booking_id))
            .await?;

    Ok(Json(BookingResponse::from(booking)))
}

/// GET /bookings/:id/history - 予約の監査イベント
pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<BookingEvent>>, ApiError> {
    let events =
        service::booking_history(&state.service_deps, &caller, BookingId::from_uuid(booking_id))
            .await?;

    Ok(Json(events))
}

/// GET /bookings/conflicts - 指定期間に重なる予約があるか
pub async fn check_conflict(
    State(state): State<Arc<AppState>>,
    Caller(_caller): Caller,
    Query(query): Query<ConflictQuery>,
) -> Result<Json<ConflictResponse>, ApiError> {
    let has_conflict = service::has_conflict(
        &state.service_deps,
        AssetId::from_uuid(query.asset_id),
        query.start_date,
        query.end_date,
        query.exclude.map(BookingId::from_uuid),
    )
    .await?;

    Ok(Json(ConflictResponse { has_conflict }))
}

/// GET /stats/bookings - ステータス別件数と売上（管理者）
pub async fn booking_stats(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<BookingStats>, ApiError> {
    let stats = service::booking_stats(&state.service_deps, &caller).await?;

    Ok(Json(stats))
}
