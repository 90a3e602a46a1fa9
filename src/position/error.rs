use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use thiserror::Error;

/// Device-level geolocation failures, as reported by the platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Error, EnumString, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("position request timed out")]
    Timeout,
}

impl PositionError {
    /// A denied permission ends the session; the others are transient.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PositionError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_snake_case_names() {
        assert_eq!(
            PositionError::from_str("permission_denied").unwrap(),
            PositionError::PermissionDenied
        );
        assert_eq!(
            PositionError::from_str("timeout").unwrap(),
            PositionError::Timeout
        );
        assert!(PositionError::from_str("bogus").is_err());
    }

    #[test]
    fn only_permission_denied_is_terminal() {
        assert!(PositionError::PermissionDenied.is_terminal());
        assert!(!PositionError::PositionUnavailable.is_terminal());
        assert!(!PositionError::Timeout.is_terminal());
    }
}
