//! Database migration runner
//!
//! Migrations live in the `migrations/` directory of this crate and are
//! embedded into the binary with [`sqlx::migrate!`]. The API server runs
//! them on startup before binding its listener.
//!
//! # Migration Files
//!
//! ```text
//! migrations/
//! ├── 0001_create_users.sql
//! ├── 0002_create_parts.sql
//! └── 0003_create_invoice_info.sql
//! ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost mid-run. Failed migrations roll back where the statements allow it.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
