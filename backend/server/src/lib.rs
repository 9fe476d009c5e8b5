//! Navigation site server.
//!
//! Serves a page of categorized external links plus the small JSON API the
//! admin page uses to edit them.
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | GET  | `/` | Rendered page, `?q=` filters cards |
//! | GET  | `/api/sites` | Stored catalog or the built-in one, `?q=` filters |
//! | POST | `/api/sites` | Replaces the catalog, needs `Authorization: Bearer <token>` |
//! | POST | `/api/auth` | `{"password"}` in, `{"token", "expiresIn"}` out |
//! | GET  | `/api/icon` | `?url=&iconUrl=&icon=`, resolves an icon from this server's network |
//! | GET  | `/api/network` | The memoized `open`/`restricted` classification |
//!
//! Every error is JSON: `{"error": "..."}`.
//!
//!
//!
//! # Icons
//!
//! The network probe starts in the background at boot. The first page render
//! waits for it, later renders reuse the answer. Each card's icon carries its
//! whole fallback list, so the browser never calls back here to find an icon.
//!
//!
//!
//! # Configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RUST_PORT` | `8788` |
//! | `REDIS_URL` | unset, KV writes disabled (`memory://` for a process-local store) |
//! | `ADMIN_PASSWORD` | required, `/run/secrets/ADMIN_PASSWORD` first |
//! | `PROBE_URL` | `https://www.google.com/favicon.ico` |
//! | `PROBE_TIMEOUT_MS` | `2000` |
//! | `ICON_TIMEOUT_MS` | `4000` |
//! | `TOKEN_TTL_SECS` | `3600` |
//! | `NETWORK` | unset, probe decides (`open` or `restricted` skips it) |
//!
//! Logging follows `RUST_LOG`.
//!
//! ```sh
//! RUST_LOG=info ADMIN_PASSWORD=changeme REDIS_URL=redis://127.0.0.1/ cargo run -p navsite
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Error;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod page;
pub mod routes;
pub mod state;

use config::Config;
use routes::{
    auth_handler, icon_handler, network_handler, not_found_handler, page_handler, sites_handler,
    update_sites_handler,
};
use state::AppState;

pub async fn start_server() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    let probe_state = state.clone();
    tokio::spawn(async move {
        probe_state.classifier.classify().await;
    });

    info!("Starting server...");

    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60 * 24));

    Router::new()
        .route("/", get(page_handler))
        .route("/api/sites", get(sites_handler).post(update_sites_handler))
        .route("/api/auth", post(auth_handler))
        .route("/api/icon", get(icon_handler))
        .route("/api/network", get(network_handler))
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
