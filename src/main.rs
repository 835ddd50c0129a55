use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use job_board::app::build_router;
use job_board::config::ServerConfig;
use job_board::jobs::model::seed_postings;
use job_board::session::CollectionStore;
use job_board::session::store::{MemoryStore, spawn_sweep_task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export SESSION_SECRET=<random string>");
        std::process::exit(1);
    });

    eprintln!("💼 Job Board v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/jobs", config.port);
    eprintln!("   Allowed origin: {}", config.client_origin);
    eprintln!("   Session TTL: {}s", config.session_ttl_secs);

    let store = MemoryStore::new(seed_postings(), config.session_ttl_secs);

    // Sweep idle sessions every minute so abandoned collections don't pile up.
    let _sweep_handle = spawn_sweep_task(Arc::clone(&store), Duration::from_secs(60));

    let app = build_router(&config, store as Arc<dyn CollectionStore>)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Job board server started");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
