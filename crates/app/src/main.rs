use std::{sync::Arc, time::Duration};

use chrono::Utc;
use engine::Engine;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "hirepurchase={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let engine = Arc::new(
        Engine::builder()
            .database(db)
            .trial_days(settings.engine.trial_days)
            .default_after_days(settings.engine.default_after_days)
            .build()
            .await?,
    );

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server_engine = engine.clone();
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(server_engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    if settings.maintenance.interval_secs > 0 {
        let every = Duration::from_secs(settings.maintenance.interval_secs);
        tasks.spawn(maintenance(engine, every));
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Refreshes purchase statuses and expires ended subscriptions every `every`.
async fn maintenance(engine: Arc<Engine>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let now = Utc::now();
        match engine.refresh_all_statuses(now.date_naive()).await {
            Ok(refresh) => tracing::info!(
                changed = refresh.purchases_changed(),
                "purchase statuses refreshed"
            ),
            Err(err) => tracing::error!("status refresh failed: {err}"),
        }
        match engine.expire_subscriptions(now).await {
            Ok(0) => {}
            Ok(expired) => tracing::info!(expired, "subscriptions expired"),
            Err(err) => tracing::error!("subscription expiry failed: {err}"),
        }
    }
}

async fn parse_database(config: &settings::Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
