//! API layer - HTTP and WebSocket entry points.

pub mod connections;
pub mod http;
pub mod websocket;

pub use connections::ConnectionManager;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::app::App;

/// Assemble the full route table. Used by `main` and by integration
/// tests that bring up a real server on an ephemeral port.
pub fn build_router(app: Arc<App>) -> Router {
    http::routes()
        .route("/ws/experience", get(websocket::ws_handler))
        .with_state(app)
        .layer(TraceLayer::new_for_http())
}
