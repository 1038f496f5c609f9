//! # Configuration Structures
//!
//! Configuration for the disposable PostgreSQL container used by integration
//! suites.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Default to the fixed values the example suite expects

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Disposable PostgreSQL container configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Describes which image to run, the environment the database is initialized
/// with, and how long to wait for it to accept connections.
///
/// ## Usage
/// ```rust,no_run
/// use config::ContainerConfig;
///
/// let config = ContainerConfig::default();
/// assert_eq!(config.image_ref(), "postgres:11.10");
/// ```
///
/// ## Validation
/// - `image`, `tag`, `user`, `database`: non-empty
/// - `password`: non-empty (the postgres image refuses to start without one)
/// - `container_port`: 1-65535
/// - `retry`: see [`RetryConfig`]
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ContainerConfig {
    /// Image repository
    #[serde(default = "default_image")]
    #[validate(length(min = 1, max = 255))]
    pub image: String,

    /// Image tag
    #[serde(default = "default_tag")]
    #[validate(length(min = 1, max = 128))]
    pub tag: String,

    /// Superuser name (`POSTGRES_USER`)
    #[serde(default = "default_user")]
    #[validate(length(min = 1, max = 63))]
    pub user: String,

    /// Superuser password (`POSTGRES_PASSWORD`)
    #[serde(default = "default_password")]
    #[validate(length(min = 1))]
    pub password: String,

    /// Database created on first start (`POSTGRES_DB`)
    #[serde(default = "default_database")]
    #[validate(length(min = 1, max = 63))]
    pub database: String,

    /// Port the server listens on inside the container
    #[serde(default = "default_container_port")]
    #[validate(range(min = 1, max = 65535))]
    pub container_port: u16,

    /// How long the runtime may take to report the container as started
    #[serde(default = "default_startup_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub startup_timeout_seconds: u64,

    /// Migration source directory; relative paths are resolved by the caller
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Connect-with-retry policy
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig
}

fn default_image() -> String {
    "postgres".to_string()
}

fn default_tag() -> String {
    "11.10".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_password() -> String {
    "123".to_string()
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_container_port() -> u16 {
    5432
}

fn default_startup_timeout() -> u64 {
    120
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("db/migrations")
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            tag: default_tag(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            container_port: default_container_port(),
            startup_timeout_seconds: default_startup_timeout(),
            migrations_dir: default_migrations_dir(),
            retry: RetryConfig::default()
        }
    }
}

impl ContainerConfig {
    /// `repository:tag` reference of the image to run.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_seconds)
    }
}

/// Backoff policy for establishing the first database connection.
///
/// Delays grow exponentially from `initial_delay_ms`, are capped at
/// `max_delay_ms` and jittered. The loop gives up after `max_attempts`
/// attempts or once `max_wait_seconds` have elapsed, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_retry_delays"))]
pub struct RetryConfig {
    #[serde(default = "default_initial_delay")]
    #[validate(range(min = 1, max = 60000))]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    #[validate(range(min = 1, max = 60000))]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 1000))]
    pub max_attempts: u32,

    #[serde(default = "default_max_wait")]
    #[validate(range(min = 1, max = 3600))]
    pub max_wait_seconds: u64
}

fn default_initial_delay() -> u64 {
    100
}

fn default_max_delay() -> u64 {
    5000
}

fn default_max_attempts() -> u32 {
    60
}

fn default_max_wait() -> u64 {
    60
}

fn validate_retry_delays(config: &RetryConfig) -> Result<(), validator::ValidationError> {
    if config.initial_delay_ms > config.max_delay_ms {
        return Err(validator::ValidationError::new(
            "initial_delay_ms must not exceed max_delay_ms"
        ));
    }
    Ok(())
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
            max_wait_seconds: default_max_wait()
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds)
    }
}
