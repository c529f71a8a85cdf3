//! # Server Module
//!
//! HTTP server setup and route configuration for the Todo server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::CredentialAuthority;
use crate::config::{Config, ServerConfig};
use crate::database::{self, Storage};
use crate::routes::health::{health, ping, root};
use crate::services::TaskService;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<CredentialAuthority>,
    pub tasks: Arc<TaskService>,
    pub store: Arc<dyn Storage>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Storage>) -> Self {
        Self {
            authority: Arc::new(CredentialAuthority::new(store.clone(), &config.auth)),
            tasks: Arc::new(TaskService::new(store.clone())),
            store,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.server)?;

    let app = Router::new()
        .route("/", get(root))
        .route("/ping", get(ping)) // Health check endpoint
        .route("/health", get(health))
        .merge(crate::routes::auth::create_auth_routes(&state))
        .merge(crate::routes::tasks::create_task_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

/// Without configured origins any origin is allowed, but then credentials
/// (cookies) cannot be, so browser clients must use the bearer header.
fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true))
}

/// Starts the Todo HTTP server.
///
/// Connects storage, builds the router and serves until Ctrl-C or SIGTERM.
pub async fn start(config: Config) -> Result<()> {
    let store = database::connect(&config.database).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store);
    let app = build_router(state)?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("🚀 Todo server starting...");
    tracing::info!("📡 Listening on http://{}", local_addr);
    tracing::info!("🏥 Health check available at http://{}/ping", local_addr);
    tracing::info!("📋 Task endpoints available at http://{}/api/v1/{{user_id}}/tasks", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("👋 Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
