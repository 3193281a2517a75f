use anyhow::{bail, Result};
use forecast_service::{
    config::AppConfig, observability, pipeline::ForecastPipeline, store::PgStore,
};
use std::{env, sync::Arc};

/// One-shot forecast against the configured database; prints the points as
/// JSON lines.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 6 {
        bail!(
            "usage: run_forecast <current|voltage|power> <meter_id> <start> <end> <day|week|month>"
        );
    }
    let meter: i64 = args[2]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid meter id '{}': {e}", args[2]))?;

    // Load configuration (FORECAST_CONFIG may point to a batch-specific file).
    let cfg = AppConfig::load()?;

    let store = PgStore::connect(&cfg.database).await?;
    let policy = cfg.forecast.policy()?;
    let pipeline = ForecastPipeline::new(Arc::new(store.clone()), Arc::new(store), policy);

    let points = pipeline
        .run_forecast_by_type(&args[1], meter, &args[3], &args[4], &args[5])
        .await?;

    for point in &points {
        println!("{}", serde_json::to_string(point)?);
    }

    Ok(())
}
