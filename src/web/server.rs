//! HTTP server setup

use crate::web::{handlers, AppState};
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn start_web_server(state: AppState) -> Result<()> {
    let host = state.config.host.clone();
    let port = state.config.port;

    let app = Router::new()
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/tasks/run-all", post(handlers::run_all_tasks))
        .route("/api/tasks/{task_id}", get(handlers::get_task))
        .route("/api/tasks/{task_id}/toggle", post(handlers::toggle_task))
        .route("/api/tasks/{task_id}/run", post(handlers::run_task))
        .route(
            "/api/tasks/{task_id}/results",
            get(handlers::get_task_results),
        )
        .route("/api/results", get(handlers::get_all_results))
        .route("/api/health/system", get(handlers::get_system_health))
        .route(
            "/api/operations/active",
            get(handlers::get_active_operations),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Web server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
