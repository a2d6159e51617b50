use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worklog::api::router;
use worklog::clock::{Clock, SystemClock};
use worklog::config::AppConfig;
use worklog::services::{RecurrenceScheduler, TaskService};
use worklog::state::AppState;
use worklog::store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "worklog=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let stores = store::open(&config.store).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut service = TaskService::load(stores.tasks, stores.definitions, clock).await?;
    if let Some(paired) = stores.paired {
        service = service.with_paired_store(paired);
    }
    let service = Arc::new(service);

    let scheduler = Arc::new(RecurrenceScheduler::new(service.clone(), config.tick_interval));
    scheduler.start()?;

    let state = AppState {
        service,
        scheduler: scheduler.clone(),
        trend_window_days: config.trend_window_days,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
