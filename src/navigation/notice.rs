use serde::Serialize;
use utoipa::ToSchema;

use super::event::TrackerEvent;

/// Short-long-short buzz used for the out-of-area alert.
pub const GEOFENCE_VIBRATION_MS: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// What the user should be shown for an event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrate_ms: Option<Vec<u32>>,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            vibrate_ms: None,
        }
    }

    /// `None` for events that only move markers around (position updates).
    pub fn for_event(event: &TrackerEvent) -> Option<Notice> {
        let notice = match event {
            TrackerEvent::PositionUpdated { .. } => return None,
            TrackerEvent::RouteFound { route } => Notice::info(format!(
                "Distance: {} | {}",
                route.summary.distance_text(),
                route.summary.time_text()
            )),
            TrackerEvent::GeofenceViolated { .. } => Notice {
                level: NoticeLevel::Warning,
                message: "Your location is outside the search area.".into(),
                vibrate_ms: Some(GEOFENCE_VIBRATION_MS.to_vec()),
            },
            TrackerEvent::StepAdvanced { instruction } => Notice::info(instruction.text.clone()),
            TrackerEvent::DirectionsCompleted => Notice::info("No more directions."),
            TrackerEvent::TrackingStopped { .. } => Notice::info("Tracking stopped."),
            TrackerEvent::Error { code, message } => Notice {
                level: NoticeLevel::Error,
                message: error_message(code, message),
                vibrate_ms: None,
            },
        };
        Some(notice)
    }
}

fn error_message(code: &str, fallback: &str) -> String {
    match code {
        "permission_denied" => {
            "Location access is denied. Please enable it in your device settings.".into()
        }
        "position_unavailable" => {
            "Error getting your location. Please make sure you allow location access.".into()
        }
        "no_position_fix" => "Your location has not been determined yet.".into(),
        "no_destination" => "Search for a destination first.".into(),
        "no_route_found" => "No route to the selected destination.".into(),
        "routing_unavailable" => "Routing is unavailable right now. Try again.".into(),
        _ => fallback.to_string(),
    }
}
