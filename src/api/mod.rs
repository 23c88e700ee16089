//! REST API over the energy service.
//!
//! Routes, nested under the configured base path (default `/api`):
//! - `GET/POST /buildings`: list and create buildings
//! - `GET/POST /energy-data`: list (filtered) and create readings
//! - `GET /predictions`: upcoming readings for one building
//! - `POST /optimize`: run the optimize transition for one building
//!
//! `GET /health` is served outside the base path.

mod handlers;
mod types;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::EnergyService;

pub use types::{ErrorResponse, HealthResponse, OptimizeRequest};

/// Application state shared across all request handlers.
///
/// Holds only the service, which in turn holds the single store handle.
#[derive(Clone)]
pub struct AppState {
    pub service: EnergyService,
}

impl AppState {
    pub fn new(service: EnergyService) -> Self {
        Self { service }
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `base_path` - Prefix for the API routes; empty mounts them at the root
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: AppState, base_path: &str) -> Router {
    let api = Router::new()
        .route(
            "/buildings",
            get(handlers::list_buildings).post(handlers::create_building),
        )
        .route(
            "/energy-data",
            get(handlers::list_energy_data).post(handlers::create_energy_data),
        )
        .route("/predictions", get(handlers::list_predictions))
        .route("/optimize", post(handlers::optimize));

    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    };

    app.route("/health", get(handlers::health))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
/// * `base_path` - Prefix for the API routes
/// * `cors` - Whether to answer cross-origin requests from any origin
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    base_path: &str,
    cors: bool,
) -> std::io::Result<()> {
    let mut app = router(state, base_path).layer(TraceLayer::new_for_http());
    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}{base_path}");
    axum::serve(listener, app).await
}
