//! HTTP surface: router, shared state and the server loop.

pub mod page;
pub mod routes;

use crate::adapters::LocalStorage;
use crate::config::Settings;
use crate::core::token::DEFAULT_MAX_DECODED_BYTES;
use crate::core::Roster;
use crate::utils::error::{AppError, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Read-only state shared by every request.
#[derive(Debug)]
pub struct AppState {
    pub roster: Roster,
    pub public_url: Option<String>,
    /// Cap on the inflated size of a token payload.
    pub max_decoded_bytes: usize,
}

impl AppState {
    pub fn new(
        roster: Roster,
        public_url: Option<String>,
        max_decoded_bytes: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            roster,
            public_url,
            max_decoded_bytes,
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            roster: Roster::default(),
            public_url: None,
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
        }
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::home))
        .route("/api", get(routes::lookup_marks))
        .route("/upload", post(routes::upload))
        .route("/api/:token/check", get(routes::check_token))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the roster, bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(settings: Settings) -> Result<()> {
    tracing::info!("Initializing state...");
    let storage = LocalStorage::new(&settings.data_dir);
    let roster = Roster::load_or_seed(&storage, &settings.fixture, settings.seed_count).await?;
    tracing::info!("Roster ready with {} students", roster.len());

    let state = AppState::new(
        roster,
        settings.public_url.clone(),
        settings.max_decoded_bytes,
    );
    let app = router(state, settings.max_upload_bytes);

    let address = settings.socket_addr()?;
    let listener = TcpListener::bind(address).await?;
    tracing::info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::IoError)?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
