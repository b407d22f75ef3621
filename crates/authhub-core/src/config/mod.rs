//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod mail;
pub mod rate_limit;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::logging::LoggingConfig;
pub use self::mail::{MailConfig, MailTransport};
pub use self::rate_limit::{RateLimitConfig, WindowLimit};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Credential store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token issuance and login policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-endpoint rate limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Notification dispatch.
    #[serde(default)]
    pub mail: MailConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `AUTHHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(env_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from a single explicit file path.
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(env_source())
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects combinations that would make the identity provider unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.allowed_audiences.is_empty() {
            return Err(AppError::configuration(
                "auth.allowed_audiences must contain at least one audience",
            ));
        }
        if self.auth.root_domain.trim().is_empty() {
            return Err(AppError::configuration("auth.root_domain must be set"));
        }
        if self.auth.session_limit == 0 {
            return Err(AppError::configuration(
                "auth.session_limit must be greater than zero",
            ));
        }
        if let Some(aud) = &self.auth.default_audience {
            if !self.auth.allowed_audiences.contains(aud) {
                return Err(AppError::configuration(format!(
                    "auth.default_audience '{aud}' is not in auth.allowed_audiences"
                )));
            }
        }
        Ok(())
    }
}

/// `AUTHHUB__SECTION__KEY` variables; list keys split on commas.
fn env_source() -> config::Environment {
    config::Environment::with_prefix("AUTHHUB")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("auth.allowed_audiences")
        .with_list_parse_key("server.cors.allowed_origins")
        .try_parsing(true)
}
