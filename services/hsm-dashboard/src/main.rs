//! HSM dashboard startup service.
//!
//! Loads every artifact of a model run from the bucket, renders the
//! prediction overlays and reports what the dashboard will show.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pipeline::query;
use pipeline::{image_target_for, run_startup_pipeline, DashboardConfig, PipelineResult};
use storage::ObjectStorage;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hsm-dashboard")]
#[command(about = "Habitat suitability model dashboard data pipeline")]
struct Args {
    /// Configuration file (YAML); defaults apply when omitted
    #[arg(short, long, env = "HSM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", env = "HSM_LOG_LEVEL")]
    log_level: String,

    /// Print the model summary table as JSON on stdout
    #[arg(long)]
    print_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting HSM dashboard pipeline");

    let config = DashboardConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!(
        bucket = %config.storage.bucket,
        backend = config.storage.backend.name(),
        data_folder = %config.artifacts.data_folder,
        "Loaded configuration"
    );

    let storage = Arc::new(ObjectStorage::new(&config.storage).context("connecting to storage")?);
    let target = image_target_for(&config, storage.clone())?;

    let result = run_startup_pipeline(&config, storage.clone(), target)
        .await
        .context("startup pipeline failed")?;

    report(&config, &result);

    if args.print_models {
        let table = query::models_table(&result);
        println!("{}", serde_json::to_string_pretty(&table)?);
    }

    Ok(())
}

/// Log what each selection will show.
fn report(config: &DashboardConfig, result: &PipelineResult) {
    for choice in query::species_choices(result, config) {
        for activity in query::activity_choices(result) {
            let Some(model) = query::selected_model(result, &choice.value, &activity) else {
                continue;
            };
            let description = query::model_description(model);
            let features = query::dependence_summary(result, config, &choice.value, &activity);
            info!(
                species = %choice.label,
                activity = %activity,
                accuracy_pct = description.accuracy_pct,
                training_points = query::training_points(result, &choice.value, &activity).len(),
                top_feature = features.first().map(|f| f.feature.as_str()).unwrap_or("-"),
                overlay = result
                    .band_images
                    .get(&model.band_name)
                    .map(|h| h.location())
                    .unwrap_or_default(),
                "Model ready"
            );
        }
    }

    match query::map_frame(result) {
        Some(frame) => info!(frame = ?frame, raster_bounds = ?result.raster_bounds, "Map frame"),
        None => warn!("Boundary has no extent"),
    }
}
