use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{navigation::NavError, web::auth::PermissionError};

pub enum ApiError {
    Permission(PermissionError),
    Validation(String),
    Navigation(NavError),
}

impl From<PermissionError> for ApiError {
    fn from(e: PermissionError) -> Self {
        ApiError::Permission(e)
    }
}

impl From<NavError> for ApiError {
    fn from(e: NavError) -> Self {
        ApiError::Navigation(e)
    }
}

fn nav_status(e: &NavError) -> StatusCode {
    match e {
        NavError::NoPositionFix
        | NavError::NoDestination
        | NavError::PermissionDenied
        | NavError::PositionUnavailable(_) => StatusCode::CONFLICT,
        NavError::RoutingUnavailable(_) | NavError::NoRouteFound => StatusCode::BAD_GATEWAY,
        NavError::WorkerGone => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Permission(e) => e.into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::Navigation(e) => (
                nav_status(&e),
                Json(ErrorResponse::with_message(e.code(), &e.to_string())),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_map_to_status_codes() {
        let status = |e: NavError| ApiError::from(e).into_response().status();
        assert_eq!(status(NavError::NoPositionFix), StatusCode::CONFLICT);
        assert_eq!(status(NavError::NoDestination), StatusCode::CONFLICT);
        assert_eq!(status(NavError::NoRouteFound), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(NavError::RoutingUnavailable("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(NavError::WorkerGone), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
