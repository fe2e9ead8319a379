use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub struct DBClient {
    pool: PgPool,
}

impl DBClient {
    /// Connects to the database behind `db_url` and brings the schema up to
    /// date. Constructed once at startup and handed to the request layer;
    /// there is no process-global pool.
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(db_url)
            .await
            .context("failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Self { pool })
    }

    pub fn conn(&self) -> &PgPool {
        &self.pool
    }
}
