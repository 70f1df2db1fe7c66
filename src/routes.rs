use axum::Router;
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::accounts::{login, profile, registration};
use crate::requests::{create as request_create, listing, status as request_status};
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on auth endpoints
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5) // Allow burst of 5
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    // Auth routes with rate limiting
    let auth_routes = Router::new()
        .route("/api/register", axum::routing::post(registration::register))
        .route("/api/login", axum::routing::post(login::login))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Worker discovery and profiles
    let account_routes = Router::new()
        .route("/api/workers", axum::routing::get(profile::list_workers))
        .route("/api/user/{id}", axum::routing::get(profile::get_user));

    // Work request lifecycle
    let request_routes = Router::new()
        .route(
            "/api/requests",
            axum::routing::post(request_create::create_request),
        )
        .route(
            "/api/requests/{id}",
            axum::routing::patch(request_status::update_status),
        )
        .route(
            "/api/requests/worker/{worker_id}",
            axum::routing::get(listing::list_for_worker),
        )
        .route(
            "/api/requests/user/{user_id}",
            axum::routing::get(listing::list_for_user),
        );

    // WebSocket endpoint: clients register their identity on the open socket
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(auth_routes)
        .merge(account_routes)
        .merge(request_routes)
        .merge(ws_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
