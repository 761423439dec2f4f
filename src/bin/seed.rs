use anyhow::Context;
use resource_hub::{config::AppConfig, seed};
use sqlx::postgres::PgPoolOptions;

/// Applies migrations and upserts the fixed seed rows.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resource_hub=info,sqlx=warn".into()),
        )
        .init();

    let config = AppConfig::load().context("invalid configuration")?;
    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "superadmin@resource-hub.local".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.db_url)
        .await
        .context("failed to connect to Postgres, check DATABASE_URL")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to apply migrations")?;

    let report = seed::run(&pool, &admin_email).await.context("seeding failed")?;
    tracing::info!(
        roles = report.roles,
        users = report.users,
        resources = report.resources,
        admin_id = %report.admin_id,
        "seed complete"
    );
    Ok(())
}
