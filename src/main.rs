use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use schedview::cli::{
    format_validation_report, get_view, resolve_serve_settings, validate_file, Cli, Commands,
    GetArgs, ServeArgs, ValidateArgs, ViewSource,
};
use schedview::config::{load_config, load_config_from, Config};
use schedview::projection::ProjectionService;
use schedview::server::{create_router, AppState};
use schedview::snapshot::FileSnapshotSource;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(ref path) => load_config_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_config().context("loading config")?,
    };

    match cli.command {
        Commands::Serve(args) => serve(args, &config).await,
        Commands::Get(args) => get(args, &config).await,
        Commands::Validate(args) => validate(args),
    }
}

async fn serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let settings = resolve_serve_settings(&args, config)?;

    let source = Arc::new(FileSnapshotSource::new(&settings.snapshot));
    let snapshot_path = source.path().display().to_string();
    let service = ProjectionService::new(source).with_queue_options(settings.queue_options);
    let app = create_router(
        AppState::with_service(service),
        settings.server.max_concurrent,
    );

    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Server listening on {}", addr);
    info!("Serving snapshot {}", snapshot_path);
    info!("Endpoints:");
    info!("  GET  /health                    - Health check");
    info!("  GET  /api/v1/visualizer/summary - Cluster summary");
    info!("  GET  /api/v1/visualizer/queues  - Queue hierarchy");
    info!("  GET  /api/v1/visualizer/jobs    - Jobs (?namespace=NS)");
    info!("  GET  /api/v1/visualizer/nodes   - Nodes and GPU slots");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn get(args: GetArgs, config: &Config) -> anyhow::Result<()> {
    let source = ViewSource::resolve(&args, config)?;
    let output = get_view(&source, &args.resource, args.output).await?;
    print!("{}", output);
    Ok(())
}

fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let report = validate_file(&args.file)?;
    print!("{}", format_validation_report(&args.file, &report));
    if !report.is_clean() {
        process::exit(2);
    }
    Ok(())
}
