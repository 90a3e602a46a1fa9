use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::navigation::checked;
use crate::geo::Coordinate;
use crate::position::{PositionError, PositionEvent};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

/// A device report: either a fix or the error the platform gave instead.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PositionReport {
    Fix(Coordinate),
    Error { error: PositionError },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PositionReportResponse {
    /// Number of open subscriptions the report reached.
    pub delivered: usize,
}

#[utoipa::path(
    post,
    path = "/api/position",
    request_body = PositionReport,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Report accepted", body = PositionReportResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "position"
)]
pub async fn report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(report): Json<PositionReport>,
) -> ApiResult<Json<PositionReportResponse>> {
    require_permission(&user, Permission::ReportPosition)?;

    let event = match report {
        PositionReport::Fix(point) => PositionEvent::Fix(checked(point)?),
        PositionReport::Error { error } => {
            log::warn!("{} reported position error: {}", user.name, error);
            PositionEvent::Error(error)
        }
    };
    let delivered = state.source.publish(event);
    Ok(Json(PositionReportResponse { delivered }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accepts_fix_or_error() {
        let fix: PositionReport = serde_json::from_str(r#"{"lat": 14.6, "lng": 120.98}"#).unwrap();
        assert!(matches!(fix, PositionReport::Fix(c) if c.lat == 14.6));

        let err: PositionReport = serde_json::from_str(r#"{"error": "permission_denied"}"#).unwrap();
        assert!(matches!(
            err,
            PositionReport::Error {
                error: PositionError::PermissionDenied
            }
        ));

        assert!(serde_json::from_str::<PositionReport>(r#"{"error": "lost"}"#).is_err());
    }

    #[test]
    fn out_of_range_fix_is_rejected() {
        assert!(checked(Coordinate { lat: 91.0, lng: 0.0 }).is_err());
        assert!(checked(Coordinate { lat: 45.0, lng: 200.0 }).is_ok());
    }
}
