//! # Environment Variable Loader
//!
//! Loads container configuration from environment variables following
//! 12-factor app principles. Unset or unparsable variables fall back to the
//! defaults in [`ContainerConfig::default`].
//!
//! # Naming Convention
//! - `PGTEST_*`: container and database settings
//! - `PGTEST_RETRY_*`: connect-with-retry policy

use crate::config::{ContainerConfig, RetryConfig};
use std::env;
use std::path::PathBuf;
use validator::Validate;

/// Load configuration from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Image: {}", config.image_ref());
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Container Settings (`PGTEST_*`)
/// - `PGTEST_IMAGE`: Image repository (default: "postgres")
/// - `PGTEST_TAG`: Image tag (default: "11.10")
/// - `PGTEST_USER`: Superuser name (default: "postgres")
/// - `PGTEST_PASSWORD`: Superuser password (default: "123")
/// - `PGTEST_DATABASE`: Database name (default: "postgres")
/// - `PGTEST_STARTUP_TIMEOUT_SECONDS`: Container start timeout (default: 120)
/// - `PGTEST_MIGRATIONS_DIR`: Migration source directory (default:
///   "db/migrations")
///
/// ### Retry Settings (`PGTEST_RETRY_*`)
/// - `PGTEST_RETRY_INITIAL_DELAY_MS`: First backoff delay (default: 100)
/// - `PGTEST_RETRY_MAX_DELAY_MS`: Backoff cap (default: 5000)
/// - `PGTEST_RETRY_MAX_ATTEMPTS`: Attempt budget (default: 60)
/// - `PGTEST_RETRY_MAX_WAIT_SECONDS`: Overall deadline (default: 60)
///
/// ## Errors
/// Returns the validation errors when the resulting configuration is invalid.
pub fn load_from_env() -> Result<ContainerConfig, Box<dyn std::error::Error>> {
    let defaults = ContainerConfig::default();
    let config = ContainerConfig {
        image: env::var("PGTEST_IMAGE").unwrap_or(defaults.image),
        tag: env::var("PGTEST_TAG").unwrap_or(defaults.tag),
        user: env::var("PGTEST_USER").unwrap_or(defaults.user),
        password: env::var("PGTEST_PASSWORD").unwrap_or(defaults.password),
        database: env::var("PGTEST_DATABASE").unwrap_or(defaults.database),
        container_port: defaults.container_port,
        startup_timeout_seconds: parse_env("PGTEST_STARTUP_TIMEOUT_SECONDS")
            .unwrap_or(defaults.startup_timeout_seconds),
        migrations_dir: env::var("PGTEST_MIGRATIONS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.migrations_dir),
        retry: load_retry_from_env(defaults.retry)
    };

    config.validate()?;
    tracing::debug!(image = %config.image_ref(), database = %config.database, "Loaded container config");

    Ok(config)
}

fn load_retry_from_env(defaults: RetryConfig) -> RetryConfig {
    RetryConfig {
        initial_delay_ms: parse_env("PGTEST_RETRY_INITIAL_DELAY_MS")
            .unwrap_or(defaults.initial_delay_ms),
        max_delay_ms: parse_env("PGTEST_RETRY_MAX_DELAY_MS").unwrap_or(defaults.max_delay_ms),
        max_attempts: parse_env("PGTEST_RETRY_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
        max_wait_seconds: parse_env("PGTEST_RETRY_MAX_WAIT_SECONDS")
            .unwrap_or(defaults.max_wait_seconds)
    }
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "PGTEST_IMAGE",
        "PGTEST_TAG",
        "PGTEST_USER",
        "PGTEST_PASSWORD",
        "PGTEST_DATABASE",
        "PGTEST_STARTUP_TIMEOUT_SECONDS",
        "PGTEST_MIGRATIONS_DIR",
        "PGTEST_RETRY_INITIAL_DELAY_MS",
        "PGTEST_RETRY_MAX_DELAY_MS",
        "PGTEST_RETRY_MAX_ATTEMPTS",
        "PGTEST_RETRY_MAX_WAIT_SECONDS",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        clear_env();
        let config = load_from_env().unwrap();
        assert_eq!(config, ContainerConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("PGTEST_TAG", "16-alpine");
            env::set_var("PGTEST_PASSWORD", "secret");
            env::set_var("PGTEST_MIGRATIONS_DIR", "/tmp/migrations");
            env::set_var("PGTEST_RETRY_MAX_ATTEMPTS", "5");
        }

        let config = load_from_env().unwrap();
        assert_eq!(config.image_ref(), "postgres:16-alpine");
        assert_eq!(config.password, "secret");
        assert_eq!(config.migrations_dir, PathBuf::from("/tmp/migrations"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.database, "postgres");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_number_falls_back_to_default() {
        clear_env();
        unsafe {
            env::set_var("PGTEST_RETRY_MAX_WAIT_SECONDS", "soon");
        }

        let config = load_from_env().unwrap();
        assert_eq!(config.retry.max_wait_seconds, 60);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_override_rejected() {
        clear_env();
        unsafe {
            env::set_var("PGTEST_PASSWORD", "");
        }

        assert!(load_from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_parse_env_missing() {
        let result: Result<u32, _> = parse_env("PGTEST_NONEXISTENT_VAR");
        assert!(result.is_err());
    }
}
