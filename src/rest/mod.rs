// rest/mod.rs — Public HTTP API server.
//
// Axum server bound to {bind_address}:{port}.
//
// Endpoints:
//   GET    /api/v1/health
//   POST   /api/v1/users
//   GET    /api/v1/users/{id}
//   PUT    /api/v1/users/{id}/goals
//   GET    /api/v1/users/{id}/meals
//   POST   /api/v1/users/{id}/meals
//   DELETE /api/v1/users/{id}/meals/{meal_id}
//   GET    /api/v1/users/{id}/totals
//   GET    /api/v1/users/{id}/achievements
//   GET    /api/v1/users/{id}/events    (SSE)
//   POST   /api/v1/users/{id}/coach

pub mod routes;
pub mod sse;

use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/users", post(routes::users::create_user))
        .route("/api/v1/users/{id}", get(routes::users::get_user))
        .route("/api/v1/users/{id}/goals", put(routes::users::update_goals))
        .route(
            "/api/v1/users/{id}/meals",
            get(routes::meals::list_meals).post(routes::meals::create_meal),
        )
        .route(
            "/api/v1/users/{id}/meals/{meal_id}",
            delete(routes::meals::delete_meal),
        )
        .route("/api/v1/users/{id}/totals", get(routes::meals::daily_totals))
        .route(
            "/api/v1/users/{id}/achievements",
            get(routes::achievements::list_achievements),
        )
        .route("/api/v1/users/{id}/events", get(sse::user_events_sse))
        .route("/api/v1/users/{id}/coach", post(routes::coach::ask_coach))
        // Browser UI runs on its own origin during development.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP API listening");

    ctx.broadcaster.broadcast(
        "server.ready",
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "port": ctx.config.port
        }),
    );

    let router = build_router(ctx);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

/// Resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
    info!("shutdown signal received — stopping HTTP API");
}
