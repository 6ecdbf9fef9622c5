use crate::metrics::MetricsRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use slog::{info, warn, Logger};
use tokio::net::TcpListener;

#[derive(Clone)]
struct MetricsState {
    registry: MetricsRegistry,
    log: Logger,
}

/// The router serving `GET /metrics`.
pub fn metrics_router(registry: MetricsRegistry, log: Logger) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState { registry, log })
}

async fn metrics_handler(State(state): State<MetricsState>) -> Response {
    match state.registry.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(state.log, "failed to encode metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Serves the registry on `listener` until the process exits.
pub async fn serve(
    listener: TcpListener,
    registry: MetricsRegistry,
    log: Logger,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(log, "serving metrics on http://{}/metrics", addr);
    }
    axum::serve(listener, metrics_router(registry, log)).await
}
