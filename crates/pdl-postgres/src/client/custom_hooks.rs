//! Connection setup and pool lifecycle hooks.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::pg_config::mask_url;
use crate::TRACING_TARGET_CONNECTION;

/// Establishes a new connection, logging how long the handshake took.
///
/// See [`ManagerConfig`] for where this is installed.
///
/// [`ManagerConfig`]: diesel_async::pooled_connection::ManagerConfig
pub fn setup_callback<C>(addr: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    let start = Instant::now();
    let masked_addr = mask_url(addr);

    async move {
        let result = C::establish(addr).await;
        let elapsed_ms = start.elapsed().as_millis();

        match &result {
            Ok(_) => tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                addr = %masked_addr,
                elapsed_ms,
                "Database connection established"
            ),
            Err(err) => tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                addr = %masked_addr,
                elapsed_ms,
                error = %err,
                "Failed to establish database connection"
            ),
        }

        result
    }
    .boxed()
}

/// Called after a connection joins the pool.
pub fn post_create(conn: &mut AsyncPgConnection, _metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            hook = "post_create",
            "Connection is broken after creation"
        );
    }

    // Never fails; a broken connection is discarded on recycle.
    Ok(())
}

/// Called before an idle connection is checked and handed out again.
pub fn pre_recycle(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    tracing::trace!(
        target: TRACING_TARGET_CONNECTION,
        hook = "pre_recycle",
        age = ?metrics.age(),
        recycle_count = metrics.recycle_count,
        "Recycling connection"
    );

    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            hook = "pre_recycle",
            recycle_count = metrics.recycle_count,
            "Connection is broken before recycling"
        );
    }

    Ok(())
}

/// Called after a connection is handed back out of the pool.
pub fn post_recycle(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            hook = "post_recycle",
            recycle_count = metrics.recycle_count,
            "Connection is broken after recycling"
        );
    }

    Ok(())
}
