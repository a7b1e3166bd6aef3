use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use diskmon_exporter::{
    config::ExporterConfig,
    probe::SystemProbe,
    router::{ExporterState, exporter_router},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diskmon", about = "Prometheus exporter for host disk statistics")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "9100")]
    port: u16,

    /// Mount path to report free/used/total space for.
    #[arg(long)]
    disk_path: Option<PathBuf>,

    /// Directory to report the recursive file size of.
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Per-scrape wall-clock budget in seconds.
    #[arg(long)]
    scrape_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("diskmon=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let mut config = ExporterConfig::from_env();
    if let Some(disk_path) = cli.disk_path {
        config.disk_path = disk_path;
    }
    if let Some(directory) = cli.directory {
        config.directory = directory;
    }
    if let Some(secs) = cli.scrape_timeout_secs
        && secs > 0
    {
        config.scrape_timeout = Duration::from_secs(secs);
    }

    info!(
        disk_path = %config.disk_path.display(),
        directory = %config.directory.display(),
        scrape_timeout_secs = config.scrape_timeout.as_secs(),
        "starting disk metrics exporter"
    );

    let state = Arc::new(ExporterState::new(Arc::new(SystemProbe::new()), config)?);
    let app = exporter_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("diskmon listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
