//! Disposable PostgreSQL container lifecycle.
//!
//! A [`PostgresContainer`] moves strictly forward through
//! `Unprovisioned -> Provisioned -> Connected -> Purged`. The container is
//! removed from the host on [`PostgresContainer::purge`], and by the runtime
//! if the handle is dropped first. Docker's default restart policy (`no`)
//! is left untouched so an exited database never comes back.

use crate::retry::retry_until_ready;
use config::{ContainerConfig, Validate};
use errors::ContainerError;
use sqlx::{Connection, PgConnection};
use testcontainers::core::ContainerPort;
use testcontainers::{ContainerAsync, GenericImage, ImageExt, runners::AsyncRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unprovisioned,
    Provisioned,
    Connected,
    Purged
}

/// Builds `postgres://<user>:<password>@<host>:<port>/<database>?sslmode=disable`.
pub fn database_url(config: &ContainerConfig, host: &str, port: u16) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode=disable",
        config.user, config.password, host, port, config.database
    )
}

pub struct PostgresContainer {
    config: ContainerConfig,
    database_url: String,
    container_id: String,
    container: Option<ContainerAsync<GenericImage>>,
    state: LifecycleState
}

impl PostgresContainer {
    /// Starts a fresh container and resolves its mapped port.
    ///
    /// Returns only once the runtime reports the container as started; the
    /// database inside may still be initializing, see [`Self::connect`].
    pub async fn provision(config: &ContainerConfig) -> Result<Self, ContainerError> {
        config
            .validate()
            .map_err(|e| ContainerError::InvalidConfig {
                reason: e.to_string()
            })?;

        let image_ref = config.image_ref();
        tracing::info!(image = %image_ref, database = %config.database, "Provisioning PostgreSQL container");

        let container = GenericImage::new(config.image.as_str(), config.tag.as_str())
            .with_exposed_port(ContainerPort::Tcp(config.container_port))
            .with_env_var("POSTGRES_USER", config.user.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_startup_timeout(config.startup_timeout())
            .start()
            .await
            .map_err(|e| ContainerError::Start {
                image: image_ref.clone(),
                reason: e.to_string()
            })?;

        let host = container
            .get_host()
            .await
            .map_err(|e| ContainerError::PortMapping {
                port: config.container_port,
                reason: e.to_string()
            })?;
        let port = container
            .get_host_port_ipv4(config.container_port)
            .await
            .map_err(|e| ContainerError::PortMapping {
                port: config.container_port,
                reason: e.to_string()
            })?;

        let container_id = container.id().to_string();
        let database_url = database_url(config, &host.to_string(), port);
        tracing::info!(container_id = %container_id, host = %host, port, "PostgreSQL container started");

        Ok(Self {
            config: config.clone(),
            database_url,
            container_id,
            container: Some(container),
            state: LifecycleState::Provisioned
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Opens a connection, retrying until it answers a ping or the retry
    /// budget in [`config::RetryConfig`] runs out.
    pub async fn connect(&mut self) -> Result<PgConnection, ContainerError> {
        if self.state == LifecycleState::Purged {
            return Err(ContainerError::Purged);
        }

        let url = self.database_url.as_str();
        let conn = retry_until_ready(&self.config.retry, || open_and_ping(url))
            .await
            .map_err(|e| ContainerError::Connect {
                attempts: e.attempts,
                reason: e
                    .last_error
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| format!("no answer within {:?}", e.elapsed))
            })?;

        tracing::info!(container_id = %self.container_id, "Database accepts connections");
        self.state = LifecycleState::Connected;
        Ok(conn)
    }

    /// Removes the container from the host. Purging twice is a no-op.
    ///
    /// `rm` consumes the runtime handle, so a failed removal cannot be
    /// retried through this handle; the dropped `ContainerAsync` makes the
    /// final removal attempt. The error is still returned so the caller can
    /// record the leak.
    pub async fn purge(&mut self) -> Result<(), ContainerError> {
        self.state = LifecycleState::Purged;

        let Some(container) = self.container.take() else {
            tracing::debug!(container_id = %self.container_id, "Container already purged");
            return Ok(());
        };

        container.rm().await.map_err(|e| ContainerError::Purge {
            container_id: self.container_id.clone(),
            reason: e.to_string()
        })?;

        tracing::info!(container_id = %self.container_id, "PostgreSQL container purged");
        Ok(())
    }
}

async fn open_and_ping(url: &str) -> Result<PgConnection, sqlx::Error> {
    let mut conn = PgConnection::connect(url).await?;
    conn.ping().await?;
    Ok(conn)
}

/// Closes a connection obtained from [`PostgresContainer::connect`].
pub async fn close_connection(conn: PgConnection) -> Result<(), ContainerError> {
    conn.close().await.map_err(|e| ContainerError::Close {
        reason: e.to_string()
    })
}
