mod app;
mod error;
mod routes;

use db::DBService;
use services::services::{config::Config, database_validator::DatabaseValidator};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let db = DBService::new(&config.database_url).await?;
    DatabaseValidator::new(db.pool.clone()).validate().await?;

    let state = AppState::new(db, &config);
    let router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "tender tracker listening");
    axum::serve(listener, router).await?;

    Ok(())
}
