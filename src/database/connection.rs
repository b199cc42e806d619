use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}
