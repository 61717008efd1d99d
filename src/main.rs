use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use tropex_api::{ApiState, RestApi};
use tropex_core::NarrowingEngine;
use tropex_storage::{StorageConfig, StorageManager};

/// Recommend films, books and shows by asking about their tropes
#[derive(Parser, Debug)]
#[command(name = "tropex")]
#[command(about = "A question-driven recommender", long_about = None)]
struct Args {
    /// Path to the data directory (snapshot and LMDB mirror)
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Trope CSV file to ingest when no persisted dataset exists
    #[arg(long)]
    tropes: Option<PathBuf>,

    /// Media CSV file; repeat for several sources
    #[arg(long)]
    media: Vec<PathBuf>,

    /// Re-ingest the CSV sources even if a snapshot exists
    #[arg(long)]
    rebuild: bool,

    /// Skip the LMDB mirror
    #[arg(long)]
    no_lmdb: bool,

    /// Candidate count at which a session counts as converged
    #[arg(long, default_value_t = 1)]
    converge_at: usize,

    /// Seconds a session may sit idle before it is discarded (0 keeps sessions until deleted)
    #[arg(long, default_value_t = 3600)]
    session_ttl: u64,

    /// HTTP API port
    #[arg(long, default_value_t = 6340)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tropex v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);

    let storage = StorageManager::open(StorageConfig {
        data_dir: args.data_dir.clone(),
        traits_file: args.tropes.clone(),
        media_files: args.media.clone(),
        use_lmdb: !args.no_lmdb,
        rebuild: args.rebuild,
    })?;
    let dataset = storage.dataset();
    info!(
        "Dataset ready: {} items, {} traits, {} relations",
        dataset.item_count(),
        dataset.trait_count(),
        dataset.relation_count()
    );

    let mut state = ApiState::new(NarrowingEngine::new(dataset), args.converge_at);
    if args.session_ttl > 0 {
        state = state.with_session_ttl(Duration::from_secs(args.session_ttl));
        info!("Idle sessions expire after {}s", args.session_ttl);
    }
    let state = Arc::new(state);

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
