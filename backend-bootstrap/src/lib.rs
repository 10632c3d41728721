pub mod context;
pub mod lifecycle;
pub mod telemetry;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use backend_infrastructure::AppConfig;

pub use context::AppContext;
pub use lifecycle::{run_scan, run_serve, scan_lines, serve};

/// Loads config, installs tracing and opens the store. Keep the guard
/// alive for the lifetime of the process.
pub async fn bootstrap() -> Result<(AppContext, Option<WorkerGuard>)> {
    let config_path = AppConfig::config_path();
    let config = AppConfig::load().await?;
    let guard = telemetry::init_tracing(&config)?;
    if config_path.exists() {
        info!("config loaded from {}", config_path.display());
    } else {
        warn!(
            "config file {} not found, using defaults",
            config_path.display()
        );
    }
    let context = AppContext::new(&config).await?;
    Ok((context, guard))
}

pub async fn run_standalone() -> Result<()> {
    let (context, _guard) = bootstrap().await?;
    run_serve(context).await
}
