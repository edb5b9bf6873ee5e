use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use std::str::FromStr;

use crate::config::Config;
use crate::error::AppResult;

#[derive(Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DatabasePool {
    pub async fn new(config: &Config) -> AppResult<Self> {
        let database_url = &config.database.url;

        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(database_url)
                .await?;

            Ok(DatabasePool::Postgres(pool))
        } else if database_url.starts_with("sqlite://") {
            let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect_with(options)
                .await?;

            Ok(DatabasePool::Sqlite(pool))
        } else {
            Err(crate::error::AppError::ConfigError(
                config::ConfigError::Message(
                    "Invalid database URL. Must start with postgres:// or sqlite://".to_string(),
                ),
            ))
        }
    }

    pub async fn migrate(&self) -> AppResult<()> {
        match self {
            DatabasePool::Postgres(pool) => {
                Migrator::new(std::path::Path::new("./migrations/postgres"))
                    .await?
                    .run(pool)
                    .await?;
            }
            DatabasePool::Sqlite(pool) => {
                Migrator::new(std::path::Path::new("./migrations/sqlite"))
                    .await?
                    .run(pool)
                    .await?;
            }
        }
        Ok(())
    }
}
