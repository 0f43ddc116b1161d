//! HTTP client configuration.
//!
//! Settings are read from an optional TOML file. Every field has a default,
//! so an empty file (or no file) yields a working configuration.
//!
//! ```toml
//! timeout_secs = 45
//! connect_timeout_secs = 5
//! pool_max_idle_per_host = 20
//! http_version = "http1"
//! ```

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// HTTP client configuration.
///
/// Supports both HTTP/1.1 and HTTP/2 via reqwest.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Maximum idle connections per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HTTP version preference.
    #[serde(default)]
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
        }
    }
}

impl HttpConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] if the document is not valid
    /// TOML, has unknown keys, or fails [`HttpConfig::validate`].
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| BridgeError::ConfigurationError(format!("invalid HTTP config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] if the file cannot be read or
    /// its contents are invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::ConfigurationError(format!(
                "cannot read HTTP config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns error if timeout values are outside valid ranges:
    /// - `timeout_secs`: must be 1-300 seconds
    /// - `connect_timeout_secs`: must be 1-60 seconds
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(BridgeError::ConfigurationError(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(BridgeError::ConfigurationError(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns connect timeout as Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 only (requires prior knowledge).
    Http2,
    /// Auto-negotiate (prefer HTTP/2, fall back to HTTP/1.1).
    #[default]
    Auto,
}

fn default_pool_max_idle() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.pool_max_idle_per_host, 100);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.http_version, HttpVersion::Auto);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_http_config_from_toml() {
        let toml = "
            pool_max_idle_per_host = 20
            timeout_secs = 45
            connect_timeout_secs = 15
            http_version = \"http2\"
        ";

        let config = HttpConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert_eq!(config.timeout_secs, 45);
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.http_version, HttpVersion::Http2);
    }

    #[test]
    fn test_http_config_empty_toml() {
        let config = HttpConfig::from_toml_str("").unwrap();
        assert_eq!(config, HttpConfig::default());
    }

    #[test]
    fn test_http_config_partial_fields() {
        let config = HttpConfig::from_toml_str("timeout_secs = 60").unwrap();
        assert_eq!(config.pool_max_idle_per_host, 100); // default
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, 10); // default
    }

    #[test]
    fn test_http_version_all_variants() {
        for (raw, expected) in [
            ("http1", HttpVersion::Http1),
            ("http2", HttpVersion::Http2),
            ("auto", HttpVersion::Auto),
        ] {
            let config = HttpConfig::from_toml_str(&format!("http_version = \"{raw}\"")).unwrap();
            assert_eq!(config.http_version, expected);
        }
    }

    #[test]
    fn test_http_version_invalid_value() {
        let result = HttpConfig::from_toml_str("http_version = \"http3\"");
        assert!(matches!(result, Err(BridgeError::ConfigurationError(_))));
    }

    #[test]
    fn test_http_config_unknown_key_rejected() {
        let result = HttpConfig::from_toml_str("timeout = 30");
        assert!(matches!(result, Err(BridgeError::ConfigurationError(_))));
    }

    #[test]
    fn test_http_config_invalid_toml() {
        let result = HttpConfig::from_toml_str("invalid syntax here");
        assert!(matches!(result, Err(BridgeError::ConfigurationError(_))));
    }

    #[test]
    fn test_http_config_validate_bounds() {
        let at_min = HttpConfig { timeout_secs: 1, connect_timeout_secs: 1, ..Default::default() };
        assert!(at_min.validate().is_ok());

        let at_max =
            HttpConfig { timeout_secs: 300, connect_timeout_secs: 60, ..Default::default() };
        assert!(at_max.validate().is_ok());

        for config in [
            HttpConfig { timeout_secs: 0, ..Default::default() },
            HttpConfig { timeout_secs: 301, ..Default::default() },
            HttpConfig { connect_timeout_secs: 0, ..Default::default() },
            HttpConfig { connect_timeout_secs: 61, ..Default::default() },
        ] {
            assert!(matches!(config.validate(), Err(BridgeError::ConfigurationError(_))));
        }
    }

    #[test]
    fn test_from_toml_str_validates() {
        let result = HttpConfig::from_toml_str("timeout_secs = 0");
        assert!(matches!(result, Err(BridgeError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("http-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "timeout_secs = 12\nhttp_version = \"http1\"").unwrap();
        drop(file);

        let config = HttpConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.http_version, HttpVersion::Http1);
    }

    #[test]
    fn test_from_file_missing() {
        let result = HttpConfig::from_file("/nonexistent/commerce-http.toml");
        let err = result.unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationError(_)));
        assert!(err.to_string().contains("/nonexistent/commerce-http.toml"));
    }
}
