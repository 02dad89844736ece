//! services/api/src/bin/api.rs

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_api_lib::{
    adapters::{PhotoDirectory, SpreadsheetStore},
    config::Config,
    error::ApiError,
    web::{admin::AdminGate, build_router, expiry_process, state::AppState},
};
use tutor_board_core::{ExpiryPolicy, ExpiryReconciler, PresenceTracker, TutorRoster};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Storage Adapters ---
    let store = Arc::new(SpreadsheetStore::new(config.tutors_path.clone()));
    let photos = Arc::new(PhotoDirectory::new(config.photo_dir.clone()));
    info!("Using tutor spreadsheet at {}", store.path().display());
    info!("Serving tutor photos from {}", photos.root().display());

    // --- 3. Presence Tracking & Roster ---
    // The tracker lives exactly as long as this process.
    let presence = Arc::new(PresenceTracker::new());
    let roster = Arc::new(TutorRoster::new(store, presence));

    let admin = AdminGate::from_password(config.admin_password.as_deref())?;
    if !admin.is_configured() {
        warn!("ADMIN_PASSWORD is not set; admin login will be refused");
    }

    // --- 4. Start the Expiry Task ---
    let policy = ExpiryPolicy::new(config.presence_timeout)
        .with_expire_unseen(config.expire_unseen);
    let shutdown = CancellationToken::new();
    let expiry_task = tokio::spawn(expiry_process(
        ExpiryReconciler::new(roster.clone(), policy),
        config.sweep_period,
        shutdown.clone(),
    ));

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(roster, photos, admin));

    // --- 6. Create the Web Router ---
    let mut app = build_router(app_state)
        .fallback_service(ServeDir::new(&config.frontend_dir))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = &config.cors_origin {
        let origin = origin.parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", origin, e))
        })?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, ACCEPT]);
        app = app.layer(cors);
    }

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("Failed to listen for Ctrl-C; shutting down");
            }
            info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    // --- 8. Tear Down ---
    shutdown.cancel();
    expiry_task
        .await
        .map_err(|e| ApiError::Internal(format!("Expiry task failed: {}", e)))?;
    info!("Server stopped");

    Ok(())
}
