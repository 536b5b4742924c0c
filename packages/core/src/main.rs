use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use mq_warn_center::api::{self, WarnsApiState};
use mq_warn_center::cli::Cli;
use mq_warn_center::config::Config;
use mq_warn_center::db;
use mq_warn_center::directory::{MonitorUserDirectory, UserDirectory};
use mq_warn_center::error::AppError;
use mq_warn_center::logging::init_logging;
use mq_warn_center::metrics::AppMetrics;
use mq_warn_center::repository::{WarnRecordStore, WarnRepository};
use mq_warn_center::services::{WarnContentService, WarnFanoutService, WarnQueryService};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::from_env().map_err(AppError::Config)?;
    cli.apply(&mut config);

    tracing::info!("Service started with config: {:?}", config);

    let pool = db::create_pool(&config.database_url).await?;

    let store: Arc<dyn WarnRecordStore> = Arc::new(WarnRepository::new(pool.clone()));
    let directory: Arc<dyn MonitorUserDirectory> = Arc::new(UserDirectory::new(pool.clone()));
    let contents = Arc::new(WarnContentService::new(store.clone()));

    let state = Arc::new(WarnsApiState {
        fanout: Arc::new(WarnFanoutService::new(contents, store.clone(), directory)),
        query: Arc::new(WarnQueryService::new(store)),
        metrics: Arc::new(AppMetrics::new()?),
        max_page_size: config.max_page_size,
        default_count_days: config.default_count_days,
    });

    let app = api::create_router(state, pool.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received. Stopping server.");
}
