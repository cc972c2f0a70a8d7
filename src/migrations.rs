//! Database migrations.
//!
//! Uses SQLx embedded migrations; applied on startup (unless disabled) and
//! by the admin CLI's `migrate` command.

use sqlx::PgPool;

static POSTGRES_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations/postgres");

pub async fn run_postgres(pool: &PgPool) -> anyhow::Result<()> {
    POSTGRES_MIGRATOR.run(pool).await?;
    Ok(())
}
