//! Client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::ACCEPT_VERSION;

/// Configuration load error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Connection settings for one client process.
///
/// Every field is optional in the config file; missing ones take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host to open the byte stream to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Value of the `accept-version` header sent on login.
    pub accept_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            accept_version: ACCEPT_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load a JSON config file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Override the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` for display.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 61613}}"#).unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 61613);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.accept_version, "1.2");
    }

    #[test]
    fn test_endpoint_override() {
        let config = ClientConfig::default().with_endpoint(Some("stomp.example".to_string()), None);
        assert_eq!(config.endpoint(), "stomp.example:7777");
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load(Path::new("/nonexistent/stomp-events.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
