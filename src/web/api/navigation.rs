use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::geo::Coordinate;
use crate::navigation::{EventRecord, NavigatorStatus, SessionSnapshot};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Replaces the selected destination before starting.
    #[serde(default)]
    pub destination: Option<Coordinate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: Option<u64>,
}

/// Deserialized coordinates skip range checks; run them before anything reaches the navigator.
pub(super) fn checked(point: Coordinate) -> ApiResult<Coordinate> {
    Coordinate::new(point.lat, point.lng).map_err(|e| ApiError::Validation(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/navigation/start",
    request_body = StartRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracking started", body = SessionSnapshot),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "No position fix or no destination", body = ErrorResponse),
        (status = 502, description = "Routing failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    require_permission(&user, Permission::ControlSession)?;
    let destination = request.destination.map(checked).transpose()?;

    let snapshot = state.navigator.start(destination).await?;
    log::info!("{} started session {}", user.name, snapshot.id);
    Ok(Json(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/navigation/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracking stopped", body = NavigatorStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<NavigatorStatus>> {
    require_permission(&user, Permission::ControlSession)?;
    state.navigator.stop().await?;
    Ok(Json(state.navigator.status()))
}

#[utoipa::path(
    post,
    path = "/api/navigation/destination",
    request_body = Coordinate,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Destination selected", body = NavigatorStatus),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn set_destination(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(destination): Json<Coordinate>,
) -> ApiResult<Json<NavigatorStatus>> {
    require_permission(&user, Permission::ControlSession)?;
    state.navigator.set_destination(checked(destination)?).await?;
    Ok(Json(state.navigator.status()))
}

#[utoipa::path(
    delete,
    path = "/api/navigation/destination",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Destination cleared", body = NavigatorStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn clear_destination(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<NavigatorStatus>> {
    require_permission(&user, Permission::ControlSession)?;
    state.navigator.clear_destination().await?;
    Ok(Json(state.navigator.status()))
}

#[utoipa::path(
    get,
    path = "/api/navigation/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Navigator status", body = NavigatorStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<NavigatorStatus>> {
    require_permission(&user, Permission::ViewStatus)?;
    Ok(Json(state.navigator.status()))
}

#[utoipa::path(
    get,
    path = "/api/navigation/events",
    params(
        ("since" = Option<u64>, Query, description = "Only events with a greater sequence number")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Recorded events, oldest first", body = Vec<EventRecord>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "navigation"
)]
pub async fn events(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<Vec<EventRecord>>> {
    require_permission(&user, Permission::ViewStatus)?;
    Ok(Json(state.navigator.events_since(query.since.unwrap_or(0))))
}
