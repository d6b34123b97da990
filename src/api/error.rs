use crate::application::booking::BookingApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// 呼び出し元を特定できない（ヘッダーなし・未登録の利用者）
    Unauthenticated,
    Application(BookingApplicationError),
}

impl From<BookingApplicationError> for ApiError {
    fn from(err: BookingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Unauthenticated => {
                let body = Json(ErrorResponse::new(
                    "UNAUTHENTICATED",
                    "Missing or unknown caller",
                ));
                return (StatusCode::UNAUTHORIZED, body).into_response();
            }
            ApiError::Application(err) => err,
        };

        let message = err.to_string();
        let (status, error_type) = match &err {
            // 404 Not Found
            BookingApplicationError::AssetNotFound => (StatusCode::NOT_FOUND, "ASSET_NOT_FOUND"),
            BookingApplicationError::BookingNotFound => {
                (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND")
            }

            // 403 Forbidden
            BookingApplicationError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            BookingApplicationError::OnboardingRequired => {
                (StatusCode::FORBIDDEN, "ONBOARDING_REQUIRED")
            }

            // 409 Conflict
            BookingApplicationError::ScheduleConflict => (StatusCode::CONFLICT, "SCHEDULE_CONFLICT"),

            // 422 Unprocessable Entity - ビジネスルール違反
            BookingApplicationError::InvalidInterval => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INTERVAL")
            }
            BookingApplicationError::AssetUnavailable => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ASSET_UNAVAILABLE")
            }
            BookingApplicationError::InvalidTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION")
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            BookingApplicationError::StorageError(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            BookingApplicationError::AssetCatalogError(e) => {
                tracing::error!("Asset catalog error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "ASSET_CATALOG_ERROR")
            }
            BookingApplicationError::IdentityProviderError(e) => {
                tracing::error!("Identity provider error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IDENTITY_PROVIDER_ERROR")
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
