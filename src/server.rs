//! Router assembly and the serve loop.
//!
//! Layers, outermost first: request tracing (when enabled), CORS, body limit,
//! session auth, handler.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::handlers;
use crate::middleware::session_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .merge(public_routes())
        // Data reads
        .merge(api_routes())
        // Identity provider callbacks
        .merge(webhook_routes())
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), session_auth_middleware))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state);

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/api", get(public::api_root))
        .route("/health", get(public::health))
}

fn api_routes() -> Router<AppState> {
    use handlers::api;

    Router::new()
        .route("/api/workspaces", get(api::workspaces_list))
        .route("/api/projects", get(api::projects_list))
        .route("/api/auth/whoami", get(api::whoami))
}

fn webhook_routes() -> Router<AppState> {
    use handlers::webhooks;

    Router::new().route("/api/webhooks/identity", post(webhooks::identity_receive))
}

/// Allow-list CORS. An empty list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Serve until Ctrl-C or SIGTERM, letting in-flight requests finish
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received CTRL+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
