pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::get_health))
        .route("/api/plans", get(routes::plans::get_plans))
        .route("/api/usage", get(routes::usage::get_usage))
        // Components
        .route("/api/skills", get(routes::artifacts::get_skills))
        .route("/api/memory", get(routes::artifacts::get_memory))
        .route("/api/rules", get(routes::artifacts::get_rules))
        .route("/api/hooks", get(routes::artifacts::get_hooks))
        // Insights
        .route(
            "/api/insights",
            get(routes::insights::get_insights).post(routes::insights::generate_insights),
        )
        .route(
            "/api/memory-service",
            get(routes::memory_service::get_memory_service),
        )
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server on `0.0.0.0:{port}`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the API server on a pre-bound listener, so a caller binding port 0
/// can read the chosen port first.
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let port = listener.local_addr()?.port();
    let app = build_router(root.clone());

    tracing::info!(root = %root.display(), "harness API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
