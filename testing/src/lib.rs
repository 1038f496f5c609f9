//! Disposable PostgreSQL containers for integration suites.
//!
//! A suite provisions one container, connects to it with retry, applies the
//! migrations under `db/migrations`, runs its cases and purges the
//! container:
//! - [`container`]: provision / connect-with-retry / purge
//! - [`migrate`]: applies a migration directory to a database URL
//! - [`suite`]: once-per-suite setup and teardown around test cases
//! - [`retry`]: bounded exponential backoff used while the database boots
//! - [`telemetry`]: `tracing` output for test processes

pub mod container;
pub mod migrate;
pub mod retry;
pub mod suite;
pub mod telemetry;

pub use container::{LifecycleState, PostgresContainer, close_connection, database_url};
pub use migrate::run_migrations;
pub use suite::{Suite, SuiteReport, SuiteRunner};
pub use telemetry::init_test_tracing;

/// Set to `1` to fail instead of skip when no container runtime is reachable.
pub const REQUIRE_DOCKER_ENV: &str = "PGTEST_REQUIRE_DOCKER";

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Best-effort check that a container runtime is reachable.
pub async fn docker_available() -> bool {
    std::env::var_os("DOCKER_HOST").is_some() || local_socket_reachable().await
}

#[cfg(unix)]
async fn local_socket_reachable() -> bool {
    tokio::net::UnixStream::connect(DOCKER_SOCKET).await.is_ok()
}

#[cfg(not(unix))]
async fn local_socket_reachable() -> bool {
    true
}

pub fn docker_required() -> bool {
    std::env::var(REQUIRE_DOCKER_ENV).as_deref() == Ok("1")
}

/// True when a Docker-backed test should run; prints why otherwise.
pub async fn should_run_container_tests(test: &str) -> bool {
    if docker_required() || docker_available().await {
        return true;
    }
    eprintln!("Skipping {}: Docker not available", test);
    false
}
