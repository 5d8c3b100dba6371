//! Dashboard configuration

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Origin of the monitoring backend, e.g. `http://127.0.0.1:8000`
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            refresh_interval_seconds: default_refresh_interval(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Config {
    /// Listing endpoint, `{api_url}/servers`.
    pub fn servers_url(&self) -> String {
        format!("{}/servers", self.api_url.trim_end_matches('/'))
    }

    /// Detail endpoint for a single iDRAC address. The address is one
    /// percent-encoded path segment.
    pub fn server_url(&self, ip: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.servers_url()).map_err(|e| {
            DashboardError::Config(format!("Invalid api_url {:?}: {}", self.api_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DashboardError::Config(format!("api_url {:?} cannot hold a path", self.api_url))
            })?
            .push(ip);
        Ok(url)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(DashboardError::Config("api_url must not be empty".to_string()));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "api_url must start with http:// or https://, got {:?}",
                self.api_url
            )));
        }
        if let Err(e) = reqwest::Url::parse(&self.api_url) {
            return Err(DashboardError::Config(format!(
                "api_url {:?} is not a valid URL: {}",
                self.api_url, e
            )));
        }
        if self.refresh_interval_seconds == 0 {
            return Err(DashboardError::Config(
                "refresh_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(DashboardError::Config(
                "request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/idrac_dashboard/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("idrac_dashboard").join("config.json"))
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    tracing::debug!("Loaded configuration from {:?}: {:?}", path, config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let config = Config {
            api_url: "http://backend:8000/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.servers_url(), "http://backend:8000/servers");
        assert_eq!(
            config.server_url("10.0.0.1").unwrap().as_str(),
            "http://backend:8000/servers/10.0.0.1"
        );
    }

    #[test]
    fn test_server_url_escapes_address() {
        let config = Config::default();
        assert_eq!(
            config.server_url("10.0.0.1/../admin").unwrap().as_str(),
            "http://127.0.0.1:8000/servers/10.0.0.1%2F..%2Fadmin"
        );
        assert_eq!(
            config.server_url("fe80::1").unwrap().as_str(),
            "http://127.0.0.1:8000/servers/fe80::1"
        );
        assert_eq!(
            config.server_url("10.0.0.1?x=1").unwrap().as_str(),
            "http://127.0.0.1:8000/servers/10.0.0.1%3Fx=1"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_url":"http://10.1.1.1:9000"}"#).unwrap();
        assert_eq!(config.api_url, "http://10.1.1.1:9000");
        assert_eq!(config.refresh_interval_seconds, 60);
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = Config {
            api_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(empty.validate(), Err(DashboardError::Config(_))));

        let no_scheme = Config {
            api_url: "127.0.0.1:8000".to_string(),
            ..Config::default()
        };
        assert!(matches!(no_scheme.validate(), Err(DashboardError::Config(_))));

        let zero_interval = Config {
            refresh_interval_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(
            zero_interval.validate(),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_url":"https://dash.example:8443","refresh_interval_seconds":15}}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.api_url, "https://dash.example:8443");
        assert_eq!(config.refresh_interval_seconds, 15);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/idrac_dashboard.json")).unwrap_err();
        match err {
            DashboardError::Config(msg) => assert!(msg.contains("Failed to read config file")),
            other => panic!("expected DashboardError::Config, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(DashboardError::Json(_))
        ));
    }
}
