use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fancy_common::observability::{LogConfig, LogFormat, init_logging};
use fancy_config::{FancyConfig, FancyConfigLoader, LoggingConfig};

mod error;
mod routes;
mod state;

const DEFAULT_CONFIG_FILE: &str = "fancy.yaml";

#[derive(Debug, Parser)]
#[command(name = "fancy", about = "Blog post text extraction service")]
struct Cli {
    /// Configuration file. Without it `fancy.yaml` is used when present.
    #[arg(long, short, env = "FANCY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => FancyConfigLoader::new().with_file(path),
        None => FancyConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: FancyConfig = loader.load().context("failed to load configuration")?;

    let log_path = init_logging(log_config(&cfg.logging)?)?;
    tracing::info!(target: "app", log_path = %log_path.display(), "app.logging.ready");

    let app_state = state::AppState::from_config(&cfg)?;
    let app = routes::create_router(app_state);

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(target: "app", %addr, "app.listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn log_config(logging: &LoggingConfig) -> Result<LogConfig> {
    let format: LogFormat = logging
        .format
        .parse()
        .map_err(|e| anyhow::anyhow!("logging.format: {e}"))?;
    Ok(LogConfig {
        app_name: "fancy",
        log_dir: logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: logging.stderr,
        format,
        default_filter: logging.filter.clone(),
    })
}
