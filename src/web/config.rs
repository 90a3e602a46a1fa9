use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::navigation::NavigationConfig;
use crate::routing::RoutingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Start and stop sessions, pick destinations.
    ControlSession,
    /// Feed device fixes and errors into the position source.
    ReportPosition,
    ViewStatus,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ControlSession => "control_session",
            Permission::ReportPosition => "report_position",
            Permission::ViewStatus => "view_status",
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config: Config = serde_yaml::from_str(
            r#"
web:
  bind: "127.0.0.1:9000"
navigation:
  arrival_radius_m: 25
routing:
  average_speed_kmh: 5
api_keys:
  - key: "secret"
    name: "phone"
    permissions: [control_session, report_position, view_status]
"#,
        )
        .unwrap();

        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(config.navigation.arrival_radius_m, Some(25.0));
        assert_eq!(config.navigation.event_log_capacity, 256);
        assert_eq!(config.routing.average_speed_kmh, 5.0);
        assert_eq!(config.routing.leg_length_m, 500.0);

        let key = config.find_api_key("secret").unwrap();
        assert_eq!(key.name, "phone");
        assert!(key.permissions.contains(&Permission::ReportPosition));
        assert!(config.find_api_key("other").is_none());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.navigation.arrival_radius_m, None);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str(
            "api_keys:\n  - key: k\n    name: n\n    permissions: [submit_schedule]\n",
        );
        assert!(result.is_err());
    }
}
