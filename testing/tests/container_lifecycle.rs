//! Integration tests for the PostgreSQL container lifecycle.
//!
//! These tests use testcontainers to spin up a PostgreSQL instance.

use config::load_from_env;
use errors::ContainerError;
use sqlx::Connection;
use testing::{
    LifecycleState, PostgresContainer, close_connection, init_test_tracing,
    should_run_container_tests
};

async fn provision() -> PostgresContainer {
    init_test_tracing();
    let config = load_from_env().expect("valid PGTEST_* configuration");
    PostgresContainer::provision(&config)
        .await
        .expect("Should start PostgreSQL container")
}

#[tokio::test]
async fn test_provision_computes_connection_string() {
    if !should_run_container_tests("test_provision_computes_connection_string").await {
        return;
    }

    let mut container = provision().await;
    assert_eq!(container.state(), LifecycleState::Provisioned);
    assert!(!container.container_id().is_empty());

    let url = container.database_url();
    assert!(url.starts_with("postgres://postgres:123@"), "{url}");
    assert!(url.ends_with("/postgres?sslmode=disable"), "{url}");

    container.purge().await.expect("Should purge container");
}

#[tokio::test]
async fn test_connect_with_retry_answers_ping() {
    if !should_run_container_tests("test_connect_with_retry_answers_ping").await {
        return;
    }

    let mut container = provision().await;
    let mut conn = container.connect().await.expect("Should connect");
    assert_eq!(container.state(), LifecycleState::Connected);
    assert!(conn.ping().await.is_ok(), "Connection should answer ping");

    let one: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(&mut conn)
        .await
        .expect("Should run a query");
    assert_eq!(one, 1);

    close_connection(conn).await.expect("Should close connection");
    container.purge().await.expect("Should purge container");
}

#[tokio::test]
async fn test_purge_is_idempotent() {
    if !should_run_container_tests("test_purge_is_idempotent").await {
        return;
    }

    let mut container = provision().await;
    container.purge().await.expect("First purge should succeed");
    container.purge().await.expect("Second purge should be a no-op");
    assert_eq!(container.state(), LifecycleState::Purged);
}

#[tokio::test]
async fn test_connect_after_purge_fails() {
    if !should_run_container_tests("test_connect_after_purge_fails").await {
        return;
    }

    let mut container = provision().await;
    container.purge().await.expect("Should purge container");

    let result = container.connect().await;
    assert!(matches!(result, Err(ContainerError::Purged)));
}
