//! Web server module
//!
//! One catch-all handler for every method and path: buffer the body once,
//! let the interceptor observe it, forward the original request. The
//! interceptor's outcome never blocks or alters the proxied exchange.

mod forward;

pub use forward::Forwarder;

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, Response, StatusCode};
use axum::Router;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Database;
use crate::intercept;

pub struct AppState {
    pub db: Database,
    pub forwarder: Forwarder,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_proxy_request)
        .with_state(state)
}

/// Proxy every inbound request, recording attack submissions on the side.
async fn handle_proxy_request(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response<Body> {
    let (parts, body) = request.into_parts();

    // The interceptor and the forwarder both need the body, so it is read
    // once here and shared.
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read request body: {}", e);
            let mut response = Response::new(Body::from("Internal Server Error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return response;
        }
    };

    if intercept::is_submission(&parts.method, parts.uri.path()) {
        intercept::observe_submission(&state.db, &body).await;
    } else if parts.method == Method::GET && parts.uri.path() == intercept::ENDPOINT_CHECK_IP {
        // Recognized but passed through untouched, reserved for later use.
        tracing::debug!("Passing through check_ip request");
    }

    state
        .forwarder
        .forward(parts.method, &parts.uri, parts.headers, body)
        .await
}

pub async fn start_server(config: &Config, db: Database) -> Result<()> {
    let forwarder = Forwarder::new(config)?;
    info!(
        "Attack pod proxy listening on {}, forwarding to {}",
        config.listen_address,
        forwarder.upstream()
    );

    let state = Arc::new(AppState { db, forwarder });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
