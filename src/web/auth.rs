use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::navigation::Navigator;
use crate::position::ChannelPositionSource;

use super::api::error::ErrorResponse;
use super::config::{Config, Permission};

/// The API key holder making the request; `name` is the key's label from the config.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub name: String,
    pub permissions: HashSet<Permission>,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub navigator: Arc<Navigator>,
    /// Device reports posted to the API land here and reach the navigator as fixes.
    pub source: Arc<ChannelPositionSource>,
}

#[derive(Debug, PartialEq)]
pub enum AuthError {
    MissingAuth,
    InvalidFormat,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AuthError::MissingAuth => ("missing_auth", "Missing Authorization header"),
            AuthError::InvalidFormat => ("invalid_auth", "Invalid Authorization format"),
            AuthError::InvalidKey => ("invalid_key", "Invalid API key"),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_message(code, message)),
        )
            .into_response()
    }
}

/// The permission the caller's key lacks.
#[derive(Debug)]
pub struct PermissionError(pub Permission);

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_message(
                "insufficient_permissions",
                &format!("requires {}", self.0.as_str()),
            )),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, &state.config)
    }
}

fn authenticate(parts: &Parts, config: &Config) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let api_key = config.find_api_key(key).ok_or_else(|| {
        log::warn!("rejected unknown API key on {}", parts.uri.path());
        AuthError::InvalidKey
    })?;

    Ok(AuthenticatedUser {
        name: api_key.name.clone(),
        permissions: api_key.permissions.clone(),
    })
}

pub fn require_permission(
    user: &AuthenticatedUser,
    permission: Permission,
) -> Result<(), PermissionError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        log::warn!("{} lacks {}", user.name, permission.as_str());
        Err(PermissionError(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn config() -> Config {
        serde_yaml::from_str(
            "api_keys:\n  - key: phone-key\n    name: phone\n    permissions: [report_position]\n",
        )
        .unwrap()
    }

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/position");
        if let Some(auth) = auth {
            builder = builder.header("Authorization", auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_key_resolves_to_user() {
        let user = authenticate(&parts(Some("Bearer phone-key")), &config()).unwrap();
        assert_eq!(user.name, "phone");
        assert!(require_permission(&user, Permission::ReportPosition).is_ok());
        assert!(require_permission(&user, Permission::ControlSession).is_err());
    }

    #[test]
    fn bad_credentials_are_rejected() {
        let config = config();
        assert_eq!(
            authenticate(&parts(None), &config).unwrap_err(),
            AuthError::MissingAuth
        );
        assert_eq!(
            authenticate(&parts(Some("Basic phone-key")), &config).unwrap_err(),
            AuthError::InvalidFormat
        );
        assert_eq!(
            authenticate(&parts(Some("Bearer other")), &config).unwrap_err(),
            AuthError::InvalidKey
        );
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let response = PermissionError(Permission::ViewStatus).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
