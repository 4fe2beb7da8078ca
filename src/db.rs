use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{NewVideo, VideoRecord};

const VIDEO_COLUMNS: &str = "id, title, description, public_id, original_size, compressed_size, duration, created_at, updated_at";

/// Persistence for video metadata rows.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, sqlx::Error>;

    async fn find(&self, id: Uuid) -> Result<Option<VideoRecord>, sqlx::Error>;

    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error>;

    /// Liveness query.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    /// Builds the pool without connecting; the first query opens a connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(&config.url)?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO videos (title, description, public_id, original_size, compressed_size, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, VideoRecord>(&query)
            .bind(&video.title)
            .bind(&video.description)
            .bind(&video.public_id)
            .bind(&video.original_size)
            .bind(&video.compressed_size)
            .bind(video.duration)
            .fetch_one(&self.pool)
            .await
    }

    async fn find(&self, id: Uuid) -> Result<Option<VideoRecord>, sqlx::Error> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");

        sqlx::query_as::<_, VideoRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
