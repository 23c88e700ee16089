//! TOML-based service configuration.

use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration parsed from TOML.
///
/// Every section has defaults, so an empty file is a valid configuration.
/// Load with [`AppConfig::from_toml_file`] or start from
/// [`AppConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log filter.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:3000"`.
    pub bind: String,
    /// Prefix for the API routes. Empty mounts them at the root.
    pub base_path: String,
    /// Answer cross-origin requests from any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            base_path: "/api".to_string(),
            cors: true,
        }
    }
}

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local collections.
    #[default]
    Memory,
    /// JSON-lines files under `data_dir`.
    File,
}

/// Document store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the `file` backend.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "energy_dash=info,tower_http=info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"server.bind"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl AppConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the bind address, if it parses.
    pub fn bind_addr(&self) -> Option<SocketAddr> {
        self.server.bind.parse().ok()
    }

    /// Replaces the port of the bind address, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        let ip = self
            .bind_addr()
            .map_or(IpAddr::from([0, 0, 0, 0]), |addr| addr.ip());
        self.server.bind = SocketAddr::new(ip, port).to_string();
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.server;

        if self.bind_addr().is_none() {
            errors.push(ConfigError {
                field: "server.bind".into(),
                message: format!(
                    "must be a socket address like \"0.0.0.0:3000\", got \"{}\"",
                    s.bind
                ),
            });
        }
        let base = &s.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            errors.push(ConfigError {
                field: "server.base_path".into(),
                message: format!(
                    "must be empty or start with '/' and not end with '/', got \"{}\"",
                    s.base_path
                ),
            });
        }

        let st = &self.storage;
        if st.backend == StorageBackend::File && st.data_dir.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "storage.data_dir".into(),
                message: "must be set when storage.backend = \"file\"".into(),
            });
        }

        if self.logging.filter.trim().is_empty() {
            errors.push(ConfigError {
                field: "logging.filter".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = AppConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[server]
bind = "127.0.0.1:8080"
base_path = "/v1"
cors = false

[storage]
backend = "file"
data_dir = "/var/lib/energy-dash"

[logging]
filter = "debug"
"#;
        let cfg = AppConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| &*c.server.base_path), Some("/v1"));
        assert_eq!(
            cfg.as_ref().map(|c| c.storage.backend),
            Some(StorageBackend::File)
        );
        assert_eq!(cfg.as_ref().map(|c| c.server.cors), Some(false));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[storage]
backend = "file"
"#;
        let cfg = AppConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| &*c.server.bind), Some("0.0.0.0:3000"));
        assert_eq!(
            cfg.as_ref().map(|c| c.storage.data_dir.clone()),
            Some(PathBuf::from("data"))
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[server]
bind = "0.0.0.0:3000"
bogus_field = true
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_backend_rejected_at_parse() {
        let toml = r#"
[storage]
backend = "mongodb"
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_bind() {
        let mut cfg = AppConfig::default();
        cfg.server.bind = "localhost".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "server.bind"));
    }

    #[test]
    fn validation_catches_bad_base_path() {
        for bad in ["api", "/api/", "/"] {
            let mut cfg = AppConfig::default();
            cfg.server.base_path = bad.to_string();
            let errors = cfg.validate();
            assert!(
                errors.iter().any(|e| e.field == "server.base_path"),
                "\"{bad}\" should be rejected"
            );
        }
    }

    #[test]
    fn validation_accepts_empty_base_path() {
        let mut cfg = AppConfig::default();
        cfg.server.base_path = String::new();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_missing_data_dir() {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackend::File;
        cfg.storage.data_dir = PathBuf::new();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.data_dir"));
    }

    #[test]
    fn set_port_keeps_host() {
        let mut cfg = AppConfig::default();
        cfg.server.bind = "127.0.0.1:3000".to_string();
        cfg.set_port(9090);
        assert_eq!(cfg.server.bind, "127.0.0.1:9090");
    }
}
