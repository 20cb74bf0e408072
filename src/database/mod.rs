use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;

pub struct DatabaseManager {
    pub pool: Pool<Sqlite>,
}

impl DatabaseManager {
    pub async fn connect(db_path: &Path) -> Result<Self, AppError> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        log::info!("Connecting to database at: {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true)
                    .foreign_keys(true),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// A private in-memory database. One connection, kept open for the life
    /// of the pool, since every new connection would see an empty database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn apply_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
        let schema = include_str!("schema.sql");

        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(pool).await.map_err(|e| {
                    AppError::Database(format!("Failed to execute schema statement '{}': {}", stmt, e))
                })?;
            }
        }
        Ok(())
    }
}
