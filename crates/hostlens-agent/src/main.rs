//! Hostlens agent binary.

use anyhow::Result;
use clap::Parser;
use hostlens_agent::{repl, Agent};
use hostlens_common_config::ConfigLoader;
use hostlens_common_log::{LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::info;

/// Host telemetry agent: snapshot, monitor, and query OS state.
#[derive(Parser, Debug)]
#[command(name = "hostlens", version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "hostlens.yaml")]
    config: PathBuf,

    /// Log level override (trace|debug|info|warn|error).
    #[arg(long, env = "HOSTLENS_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = args.log_level.as_deref().and_then(LogLevel::parse) {
        log_config.level = level;
    }
    hostlens_common_log::init(log_config)?;

    info!("starting hostlens v{}", env!("CARGO_PKG_VERSION"));

    // Config problems are fatal: no monitors start, no queries served.
    let config = ConfigLoader::new(&args.config).load()?;

    let agent = Agent::bootstrap(config).await?;

    repl::run(&agent).await?;

    agent.shutdown().await;
    info!("agent shutdown complete");
    Ok(())
}
