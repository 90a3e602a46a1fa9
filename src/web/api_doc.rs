use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::navigation::{EventsQuery, StartRequest};
use super::api::position::{PositionReport, PositionReportResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::navigation::start,
        super::api::navigation::stop,
        super::api::navigation::set_destination,
        super::api::navigation::clear_destination,
        super::api::navigation::status,
        super::api::navigation::events,
        super::api::position::report,
    ),
    components(
        schemas(
            ErrorResponse,
            StartRequest,
            EventsQuery,
            PositionReport,
            PositionReportResponse,
            crate::geo::Coordinate,
            crate::geo::Geofence,
            crate::position::PositionError,
            crate::routing::Route,
            crate::routing::RouteSummary,
            crate::routing::Instruction,
            crate::navigation::TrackedPosition,
            crate::navigation::TrackerEvent,
            crate::navigation::SessionSnapshot,
            crate::navigation::NavigatorStatus,
            crate::navigation::EventRecord,
            crate::navigation::Notice,
            crate::navigation::NoticeLevel,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "navtrack API",
        description = "Live navigation tracking: sessions, device positions and tracker events",
        version = "0.1.0"
    ),
    tags(
        (name = "navigation", description = "Tracking sessions and destinations"),
        (name = "position", description = "Device position reports")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
