use axum::body::Body;
use axum::http::{Request, StatusCode};
use rental_booking_ddd::api::handlers::{AppState, CALLER_HEADER};
use rental_booking_ddd::api::router::create_router;
use rental_booking_ddd::api::types::*;
use rental_booking_ddd::domain::{BookingId, BookingStatus, Identity, Money};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::TestHarness;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

fn setup_e2e_app(h: &TestHarness) -> axum::Router {
    let app_state = Arc::new(AppState {
        service_deps: h.deps.clone(),
    });
    create_router(app_state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    caller: Option<&Identity>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller.user_id.value().to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_e2e_full_booking_flow() {
    let h = TestHarness::new();
    let asset = h.add_car(1000);
    let user = h.identities.add_user();
    let admin = h.identities.add_admin();
    let app = setup_e2e_app(&h);

    // Step 1: 予約作成（POST /bookings）
    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&user),
        Some(json!({
            "asset_id": asset.asset_id.value(),
            "start_date": "2024-01-01T10:00:00Z",
            "end_date": "2024-01-04T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: BookingResponse = parse(&body);
    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(created.base_price, Money::new(3000));
    assert_eq!(created.pickup_address, asset.address);

    // Step 2: 予約詳細（GET /bookings/:id）
    let uri = format!("/bookings/{}", created.booking_id);
    let (status, body) = send(&app, "GET", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: BookingResponse = parse(&body);
    assert_eq!(fetched.booking_id, created.booking_id);

    // Step 3: 承認（PATCH /bookings/:id/status）
    let status_uri = format!("/bookings/{}/status", created.booking_id);
    let (status, body) = send(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<BookingResponse>(&body).status, BookingStatus::Approved);

    // Step 4: 返却と精算
    let (status, body) = send(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "returned", "returned_at": "2024-01-04T13:30:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let settled: BookingResponse = parse(&body);
    assert_eq!(settled.status, BookingStatus::Completed);
    assert_eq!(settled.penalty_amount, Money::new(200));
    assert_eq!(settled.final_price, Money::new(3200));
    assert!(settled.actual_return_date.is_some());

    // Step 5: 履歴と集計
    let (status, body) = send(&app, "GET", &format!("{}/history", uri), Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<Value> = parse(&body);
    assert_eq!(history.len(), 3);

    let (status, body) = send(&app, "GET", "/stats/bookings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = parse(&body);
    assert_eq!(stats["total_bookings"], 1);
    assert_eq!(stats["status_counts"]["completed"], 1);
    assert_eq!(stats["total_revenue"], 3200);

    let (status, body) = send(&app, "GET", "/bookings/mine", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Vec<BookingResponse>>(&body).len(), 1);
}

#[tokio::test]
async fn test_e2e_update_dates_and_cancel() {
    let h = TestHarness::new();
    let asset = h.add_car(500);
    let user = h.identities.add_user();
    let app = setup_e2e_app(&h);

    let (_, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&user),
        Some(json!({
            "asset_id": asset.asset_id.value(),
            "start_date": "2024-02-01T00:00:00Z",
            "end_date": "2024-02-02T00:00:00Z",
        })),
    )
    .await;
    let created: BookingResponse = parse(&body);
    let uri = format!("/bookings/{}", created.booking_id);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&user),
        Some(json!({
            "start_date": "2024-02-01T00:00:00Z",
            "end_date": "2024-02-04T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<BookingResponse>(&body).base_price, Money::new(1500));

    let conflict_uri = format!(
        "/bookings/conflicts?asset_id={}&start_date=2024-02-02T00:00:00Z&end_date=2024-02-03T00:00:00Z",
        asset.asset_id.value()
    );
    let (status, body) = send(&app, "GET", &conflict_uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(parse::<ConflictResponse>(&body).has_conflict);

    let (status, body) = send(&app, "DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<BookingResponse>(&body).status, BookingStatus::Cancelled);

    let (status, body) = send(&app, "GET", &conflict_uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!parse::<ConflictResponse>(&body).has_conflict);
}

// ============================================================================
// E2Eテスト: エラー系
// ============================================================================

#[tokio::test]
async fn test_e2e_error_status_codes() {
    let h = TestHarness::new();
    let asset = h.add_car(1000);
    let user = h.identities.add_user();
    let other = h.identities.add_user();
    let app = setup_e2e_app(&h);

    let request = json!({
        "asset_id": asset.asset_id.value(),
        "start_date": "2024-03-01T00:00:00Z",
        "end_date": "2024-03-05T00:00:00Z",
    });

    // 呼び出し元なし → 401
    let (status, _) = send(&app, "POST", "/bookings", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/bookings", Some(&user), Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: BookingResponse = parse(&body);

    // 期間の重複 → 409
    let (status, body) = send(&app, "POST", "/bookings", Some(&other), Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorResponse>(&body).error, "SCHEDULE_CONFLICT");

    // 終了が開始以前 → 422
    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&user),
        Some(json!({
            "asset_id": asset.asset_id.value(),
            "start_date": "2024-04-05T00:00:00Z",
            "end_date": "2024-04-01T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse::<ErrorResponse>(&body).error, "INVALID_INTERVAL");

    // 他人の予約 → 403
    let uri = format!("/bookings/{}", created.booking_id);
    let (status, _) = send(&app, "GET", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 一般利用者の管理操作 → 403
    let (status, _) = send(&app, "GET", "/bookings", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", "/stats/bookings", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 存在しない予約 → 404
    let missing = format!("/bookings/{}", BookingId::new().value());
    let (status, body) = send(&app, "GET", &missing, Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BOOKING_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_health_check() {
    let h = TestHarness::new();
    let app = setup_e2e_app(&h);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_e2e_stats_shape() {
    let h = TestHarness::new();
    let admin = h.identities.add_admin();
    let app = setup_e2e_app(&h);

    let (status, body) = send(&app, "GET", "/stats/bookings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = parse(&body);
    assert_eq!(stats["total_bookings"], 0);
    assert_eq!(stats["total_revenue"], 0);
    assert!(stats["status_counts"].as_object().unwrap().is_empty());
}
