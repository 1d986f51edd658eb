//! A minimal `/metrics` + `/healthz` server, simplified from the
//! reference kernel's `ioi-telemetry` http module (no `tower-http`
//! layering in this workspace: no trace/load-shed/timeout middleware).

use axum::routing::get;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::metrics::KernelMetrics;

async fn metrics_handler(State(metrics): State<Arc<KernelMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; version=0.0.4")],
            e.to_string().into_bytes(),
        ),
    }
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

fn router(metrics: Arc<KernelMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(metrics)
}

/// Serves `/metrics` and `/healthz` until the process receives Ctrl-C.
pub async fn serve(addr: SocketAddr, metrics: Arc<KernelMetrics>) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "telemetry server listening");
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("telemetry server received shutdown signal"),
        Err(e) => tracing::warn!(error = %e, "failed to install Ctrl-C handler"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_returns_ok() {
        let metrics = Arc::new(KernelMetrics::new().unwrap());
        let app = router(metrics);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_registered_series() {
        let metrics = Arc::new(KernelMetrics::new().unwrap());
        metrics.frames_committed.inc();
        let app = router(metrics);
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
