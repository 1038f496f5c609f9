//! # Harness Errors
//!
//! Error types for the container lifecycle helper and the suite runner.
//!
//! Uses `thiserror` with named fields so every message carries the context
//! needed to tell which lifecycle step failed.

use thiserror::Error;

/// Failures of the container lifecycle: provision, connect, migrate, purge.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Invalid container configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to start container {image}: {reason}")]
    Start { image: String, reason: String },

    #[error("No host port mapped for container port {port}: {reason}")]
    PortMapping { port: u16, reason: String },

    #[error("Database not reachable after {attempts} attempts: {reason}")]
    Connect { attempts: u32, reason: String },

    #[error("Migration from {source_dir} failed: {reason}")]
    Migration { source_dir: String, reason: String },

    #[error("Failed to close database connection: {reason}")]
    Close { reason: String },

    #[error("Failed to purge container {container_id}: {reason}")]
    Purge {
        container_id: String,
        reason: String
    },

    #[error("Container has already been purged")]
    Purged
}

/// Suite-level failures that abort a run before any case executes.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// `cleanup_failures` holds what teardown reported after the failed
    /// setup, empty when cleanup went through.
    #[error("Setup of suite {suite} failed: {reason}{}", cleanup_suffix(.cleanup_failures))]
    Setup {
        suite: String,
        reason: String,
        cleanup_failures: Vec<String>
    }
}

fn cleanup_suffix(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!("; cleanup failed: {}", failures.join("; "))
    }
}
