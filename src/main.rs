//! Scanserver - Equipment QR scan resolution service
//!
//! Main entry point.

use scanserver::{
    capture_session::{CaptureDevice, CaptureSession, ReplayDevice},
    event_hub::EventHub,
    record_resolver::{FallbackStore, RecordResolver},
    scan_controller::ScanController,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scanserver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scanserver v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        api_base_url = ?config.api_base_url,
        seed_file = ?config.seed_file,
        device_file = ?config.device_file,
        debounce_ms = config.debounce_ms,
        "Configuration loaded"
    );

    // Initialize components
    let fallback = Arc::new(FallbackStore::new());
    if let Some(ref seed) = config.seed_file {
        match fallback.load_seed(seed).await {
            Ok(count) => tracing::info!(count, seed = %seed.display(), "Fallback store seeded"),
            Err(e) => tracing::error!(error = %e, seed = %seed.display(), "Failed to load seed file"),
        }
    }

    let resolver = Arc::new(RecordResolver::new(
        config.api_base_url.clone(),
        fallback.clone(),
    ));
    if resolver.remote_configured() {
        tracing::info!("RecordResolver initialized (remote source configured)");
    } else {
        tracing::info!("RecordResolver initialized (local fallback only)");
    }

    let hub = Arc::new(EventHub::new());

    let device: Arc<dyn CaptureDevice> = match config.device_file {
        Some(ref path) => {
            let replay = ReplayDevice::from_file(
                path,
                Duration::from_millis(config.frame_interval_ms),
            )
            .await?;
            tracing::info!(device_file = %path.display(), "ReplayDevice initialized");
            Arc::new(replay)
        }
        None => {
            tracing::info!("No SCAN_DEVICE_FILE set, using empty replay device");
            Arc::new(ReplayDevice::new(
                Vec::new(),
                Duration::from_millis(config.frame_interval_ms),
            ))
        }
    };

    let (session, detections) =
        CaptureSession::new(device, Duration::from_millis(config.debounce_ms));
    let session = Arc::new(session);

    let controller = Arc::new(ScanController::new(resolver.clone(), hub.clone()));
    controller.clone().spawn_detection_pump(detections);
    tracing::info!("ScanController initialized, detection pump running");

    // Create application state
    let state = AppState {
        config,
        session,
        controller,
        resolver,
        fallback,
        hub,
        started_at: Instant::now(),
    };

    // Create router
    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
