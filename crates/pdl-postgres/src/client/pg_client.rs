use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool};
use derive_more::{Deref, DerefMut};
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::custom_hooks;
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CONNECTION,
};

/// Connection pool status information.
#[derive(Debug, Clone)]
pub struct PgPoolStatus {
    /// Maximum number of connections in the pool
    pub max_size: usize,
    /// Current number of connections in the pool
    pub size: usize,
    /// Number of available connections
    pub available: usize,
    /// Number of requests waiting for connections
    pub waiting: usize,
}

impl PgPoolStatus {
    /// Returns whether tasks are queued waiting for a connection.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.waiting > 0 || (self.size >= self.max_size && self.available == 0)
    }
}

/// Pooled PostgreSQL client shared by every worker task.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Builds the connection pool. No connection is opened until first use.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(custom_hooks::setup_callback);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.postgres_url, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::post_create))
            .pre_recycle(Hook::sync_fn(custom_hooks::pre_recycle))
            .post_recycle(Hook::sync_fn(custom_hooks::post_recycle))
            .build()
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Failed to create connection pool");
                PgError::Unexpected(format!("Failed to build connection pool: {}", e).into())
            })?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            max_connections = config.postgres_max_connections,
            "Database client initialized"
        );

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Runs `SELECT 1` on a pooled connection to verify connectivity.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn ping(&self) -> PgResult<()> {
        #[derive(diesel::QueryableByName)]
        struct Ping {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            #[allow(dead_code)]
            result: i32,
        }

        let mut conn = self.get_pooled_connection().await?;
        let _: Ping = diesel::sql_query("SELECT 1 AS result")
            .get_result(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Database connectivity check failed");
                PgError::from(e)
            })?;

        Ok(())
    }

    /// Gets a connection from the pool.
    ///
    /// Returns a [`PgConn`] that implements the repository traits through
    /// [`Deref`] to the underlying connection.
    pub async fn get_connection(&self) -> PgResult<PgConn> {
        let start = Instant::now();
        let conn = self.get_pooled_connection().await?;

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                elapsed = ?elapsed,
                status = ?self.pool_status(),
                "Connection acquisition took longer than expected"
            );
        }

        Ok(PgConn { conn })
    }

    pub(crate) async fn get_pooled_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                "Failed to acquire connection from pool"
            );
            PgError::from(e)
        })
    }

    /// Gets the current pool status.
    #[inline]
    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.inner.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Gets the configuration used by this client.
    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .field("pool", &self.pool_status())
            .finish()
    }
}

/// A pooled connection, returned to the pool on drop.
///
/// ```ignore
/// let mut conn = pg_client.get_connection().await?;
/// let processed = conn.list_processed_customers().await?;
/// ```
#[derive(Deref, DerefMut)]
pub struct PgConn {
    #[deref]
    #[deref_mut]
    conn: PooledConnection,
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_saturation() {
        let idle = PgPoolStatus {
            max_size: 4,
            size: 2,
            available: 2,
            waiting: 0,
        };
        assert!(!idle.is_saturated());

        let full = PgPoolStatus {
            max_size: 4,
            size: 4,
            available: 0,
            waiting: 0,
        };
        assert!(full.is_saturated());
    }

    #[tokio::test]
    async fn test_client_builds_without_connecting() {
        let client = PgConfig::new("postgresql://user:pw@127.0.0.1:1/pdl")
            .with_max_connections(2)
            .build()
            .unwrap();
        assert_eq!(client.pool_status().max_size, 2);
        assert!(!format!("{client:?}").contains("pw@"));
    }
}
