//! Keep-alive HTTP stub.
//!
//! A single stateless endpoint so free-tier hosts see the process as a
//! live web service.

use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

pub async fn run_keepalive(port: u16) {
    let app = Router::new().route("/", get(|| async { "Bot is running!" }));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("Keep-alive endpoint disabled, bind to port {} failed: {}", port, e);
            return;
        }
    };

    info!("Keep-alive endpoint listening on port {}", port);
    if let Err(e) = axum::serve(listener, app).await {
        warn!("Keep-alive server stopped: {}", e);
    }
}
