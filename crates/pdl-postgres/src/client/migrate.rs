use std::time::Instant;

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Applies every pending embedded migration and returns the applied versions.
///
/// Diesel's migration harness is synchronous, so it runs on the blocking
/// pool behind an [`AsyncConnectionWrapper`].
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<Vec<String>> {
    let start = Instant::now();
    let conn = pg.get_pooled_connection().await?;
    let mut conn: AsyncConnectionWrapper<_> = conn.into();

    let versions = spawn_blocking(move || {
        conn.run_pending_migrations(MIGRATIONS).map(|versions| {
            versions
                .into_iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
        })
    })
    .await
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Migration task panicked");
        PgError::Migration(err.into())
    })?
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Database migration failed");
        PgError::Migration(err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        elapsed = ?start.elapsed(),
        applied = versions.len(),
        "Database schema is up to date"
    );

    Ok(versions)
}
