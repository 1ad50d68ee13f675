//! Binary entry point: a small `clap` CLI wrapping the HTTP service.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rfp_orchestrator::config::Settings;
use rfp_orchestrator::container::Container;
use rfp_orchestrator::graph::build_pipeline;
use rfp_orchestrator::http::{build_router, AppState};
use rfp_orchestrator::retrieval::{PdfRetrievalService, RetrievalService};
use rfp_orchestrator::risk::WeightedRiskScorer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rfp-orchestrator", about = "Procurement/RFP question-answering service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Starts the HTTP server.
    Serve,
    /// Ingests a single PDF into the index and exits.
    Ingest {
        /// Path to the PDF file.
        path: PathBuf,
    },
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if settings.app_env == rfp_orchestrator::config::AppEnv::Production {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings);

    match cli.command {
        Commands::Serve => run_server(settings).await,
        Commands::Ingest { path } => run_ingest(settings, &path).await,
    }
}

async fn run_server(settings: Settings) -> ExitCode {
    let retrieval: Arc<dyn RetrievalService> = match PdfRetrievalService::open(std::path::Path::new(&settings.index_db_path)) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!(error = %e, "failed to open retrieval index");
            return ExitCode::FAILURE;
        }
    };

    let container = Container::new(settings.llm_base_url.clone(), settings.llm_model.clone());
    let scorer = Arc::new(WeightedRiskScorer);
    let graph = Arc::new(build_pipeline(&container, Arc::clone(&retrieval), scorer, &settings));
    let cache = Arc::new(rfp_orchestrator::http::cache::TtlLruCache::new(settings.cache_ttl, settings.cache_max_size));

    let state = AppState { graph, retrieval, cache };
    let router = build_router(state);

    let addr = format!("{}:{}", settings.http_host, settings.http_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(addr, "listening");
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "server terminated with an error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run_ingest(settings: Settings, path: &std::path::Path) -> ExitCode {
    let retrieval = match PdfRetrievalService::open(std::path::Path::new(&settings.index_db_path)) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("failed to open retrieval index: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
        eprintln!("invalid file path: {}", path.display());
        return ExitCode::FAILURE;
    };

    match retrieval.ingest_document(path, filename).await {
        Ok(chunks) => {
            println!("ingested '{filename}': {chunks} chunks");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ingestion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
