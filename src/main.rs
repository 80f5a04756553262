mod cli;

use clap::Parser;
use cli::Cli;
use std::sync::Arc;
use tracing::info;

use hoist::config::Config;
use hoist::http::HttpClient;
use hoist::observability::{RunStats, init_tracing};
use hoist::options::RunOptions;
use hoist::orchestrator::{upload_all, validate_inputs};
use hoist::output::OutputSink;
use hoist::registry::{ExtensionCatalog, select_uploader, uploader_id};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = RunOptions::from(cli);
    let config = Config::load(options.config_file.as_deref())?;

    let limit = options.size_limit.unwrap_or(config.max_upload_size);
    validate_inputs(&options.local_paths, limit).await?;

    let extensions_dir = options
        .extensions_dir
        .clone()
        .unwrap_or_else(|| config.extensions_dir());
    let catalog = ExtensionCatalog::load_dir(&extensions_dir)?;

    let id = uploader_id(&options, &config)?;
    let sink = OutputSink::new(&options, &config)?;
    let http = HttpClient::new(&config.http)?;

    let config = Arc::new(config);
    let options = Arc::new(options);
    let mut uploader = select_uploader(&id, config, Arc::clone(&options), http, &catalog)?;
    uploader.set_callback(sink.into_callback());

    info!(uploader = %id, files = options.local_paths.len(), "Starting upload");

    let stats = RunStats::new();
    upload_all(
        uploader.as_ref(),
        &options.local_paths,
        options.target_dir.as_deref(),
        &stats,
    )
    .await;

    let snapshot = stats.snapshot();
    info!(
        total = snapshot.total(),
        finished = snapshot.finished,
        failed = snapshot.failed,
        ignored = snapshot.ignored,
        "Run complete"
    );

    if snapshot.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
