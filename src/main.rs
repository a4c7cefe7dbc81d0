use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubely::config::{IngestConfig, StorageConfig};
use tubely::infrastructure::storage;
use tubely::services::assets::AssetStore;
use tubely::services::ingest::IngestService;
use tubely::services::media::{FfmpegTool, FfprobeTool};
use tubely::services::videos::InMemoryVideoRepository;
use tubely::{AppState, create_app};

#[derive(Parser, Debug)]
#[command(author, version, about = "Video ingestion server", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8091)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubely=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Tubely...");

    let mut ingest_config = IngestConfig::from_env();
    if std::env::var("PUBLIC_BASE_URL").is_err() {
        ingest_config.public_base_url = format!("http://localhost:{}", args.port);
    }
    let config = Arc::new(ingest_config);
    info!(
        "🎬 Ingest Config: Max Video={}MB, Max Thumbnail={}MB, Presign TTL={}s, Staging={}",
        config.max_video_size / 1024 / 1024,
        config.max_thumbnail_size / 1024 / 1024,
        config.presign_ttl.as_secs(),
        config.staging_dir.display()
    );

    tokio::fs::create_dir_all(&config.staging_dir).await?;

    // Setup Infrastructure
    let storage_config = StorageConfig::from_env()?;
    let storage_service = storage::setup_storage(&storage_config).await;

    let assets = Arc::new(AssetStore::new(
        config.assets_root.clone(),
        &config.public_base_url,
    )?);
    assets.ensure_root().await?;

    let ingest = Arc::new(IngestService::new(
        config.clone(),
        storage_service.clone(),
        Arc::new(FfprobeTool::new(config.ffprobe_bin.clone())),
        Arc::new(FfmpegTool::new(config.ffmpeg_bin.clone())),
    ));

    let state = AppState {
        config: config.clone(),
        storage: storage_service,
        videos: Arc::new(InMemoryVideoRepository::new()),
        ingest,
        assets,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
