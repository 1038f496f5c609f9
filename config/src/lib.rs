//! # Configuration System
//!
//! Configuration for disposable PostgreSQL test containers.
//!
//! This crate provides:
//! - [`ContainerConfig`] and [`RetryConfig`] with defaults for the example
//!   suite (`postgres:11.10`, password `123`, database `postgres`)
//! - Environment variable loading (12-factor app principles)
//! - Validation through the `validator` crate

pub mod config;
pub mod loader;

pub use config::{ContainerConfig, RetryConfig};
pub use loader::load_from_env;
pub use validator::Validate;
