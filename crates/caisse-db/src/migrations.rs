//! # Database Migrations
//!
//! Embedded SQL migrations for the terminal store.
//!
//! The `sqlx::migrate!()` macro embeds all SQL files from
//! `migrations/terminal` into the binary at compile time; no runtime file
//! access is needed. Migrations run in filename order, each in its own
//! transaction, and are recorded in `_sqlx_migrations`.
//!
//! Never modify an applied migration; add a new `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/terminal");

/// Runs all pending migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending terminal migrations");

    MIGRATOR.run(pool).await?;

    info!("All terminal migrations applied");
    Ok(())
}
