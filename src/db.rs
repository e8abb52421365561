use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;

/// Open the pool, check it answers, and bring the schema up to date.
pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let mut options = PgPoolOptions::new().max_connections(cfg.max_connections);
    if let Some(minutes) = cfg.max_lifetime_minutes {
        options = options.max_lifetime(Duration::from_secs(minutes.saturating_mul(60)));
    }
    let db = options
        .connect(&cfg.url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    Ok(db)
}
