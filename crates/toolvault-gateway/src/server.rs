// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use toolvault_config::{ServerConfig, SharingConfig};
use toolvault_core::{IdentityProvider, StorageAdapter, ToolvaultError};
use toolvault_sharing::{CredentialStore, ShareManager, ToolAdmin};
use toolvault_vault::{Cipher, SecretGate};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Resolves bearer tokens to identities.
    pub identity: Arc<dyn IdentityProvider + Send + Sync>,
    /// Record store, used directly only for health reporting.
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    pub tools: Arc<ToolAdmin>,
    pub credentials: Arc<CredentialStore>,
    pub shares: Arc<ShareManager>,
}

impl GatewayState {
    pub fn new(
        identity: Arc<dyn IdentityProvider + Send + Sync>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        cipher: Arc<Cipher>,
        gate: Arc<SecretGate>,
        sharing: SharingConfig,
    ) -> Self {
        Self {
            identity,
            tools: Arc::new(ToolAdmin::new(Arc::clone(&storage))),
            credentials: Arc::new(CredentialStore::new(Arc::clone(&storage), Arc::clone(&cipher))),
            shares: Arc::new(ShareManager::new(Arc::clone(&storage), cipher, gate, sharing)),
            storage,
        }
    }
}

/// Build the full application router.
///
/// - GET /health, POST /api/share/resolve (public)
/// - everything else under /api (bearer auth)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/share/resolve", post(handlers::resolve_share))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/api/tools",
            post(handlers::create_tool)
                .put(handlers::update_tool)
                .delete(handlers::delete_tool),
        )
        .route(
            "/api/tools/access",
            post(handlers::grant_access).delete(handlers::revoke_access),
        )
        .route(
            "/api/credentials",
            get(handlers::list_credentials)
                .post(handlers::create_credential)
                .put(handlers::update_credential)
                .delete(handlers::delete_credential),
        )
        .route("/api/share", post(handlers::create_share))
        .route("/api/share/revoke", post(handlers::revoke_share))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ToolvaultError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ToolvaultError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("listening on {addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| ToolvaultError::Internal(format!("server error: {e}")))?;

    Ok(())
}
