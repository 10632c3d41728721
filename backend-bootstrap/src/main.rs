use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campus-attendance")]
#[command(about = "Campus event attendance backend", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Check in codes read line by line from stdin
    Scan {
        /// Event the scans belong to
        #[arg(long)]
        event: String,
        /// Operator account performing the scans
        #[arg(long)]
        operator: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = &args.config {
        std::env::set_var("CAMPUS_CONFIG", config);
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => backend_bootstrap::run_standalone().await,
        Command::Scan { event, operator } => {
            let (context, _guard) = backend_bootstrap::bootstrap().await?;
            let summary = backend_bootstrap::run_scan(context, event, operator).await?;
            info!(
                "scanned {} codes: {} recorded, {} rejected, {} failed",
                summary.decoded, summary.recorded, summary.rejected, summary.failed
            );
            Ok(())
        }
    }
}
