use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use forecast_service::{
    config::AppConfig,
    metrics_server,
    observability,
    pipeline::ForecastPipeline,
    routes,
    store::PgStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = PgStore::connect(&cfg.database).await?;
    let policy = cfg.forecast.policy()?;
    let pipeline = ForecastPipeline::new(Arc::new(store.clone()), Arc::new(store), policy);

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "forecast service listening");

    axum::serve(listener, routes::router(pipeline).into_make_service()).await?;

    Ok(())
}
