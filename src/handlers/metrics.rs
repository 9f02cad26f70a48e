//! Metrics endpoint handler for Prometheus scraping.
//!
//! The handler never talks to supervisord itself. It renders whatever the
//! background scrape task stored last.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    debug!("Processing /metrics request");

    let families = {
        let _render = state.render_lock.lock().await;
        let latest = state.latest.read().await;
        state.metrics.refresh(latest.as_ref(), &state.scrape_stats);
        state.registry.gather()
    };

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .map_err(|e| {
            error!("Failed to encode metrics: {}", e);
            MetricsError::EncodingFailed
        })?;

    String::from_utf8(buffer).map_err(|e| {
        error!("Metrics output is not valid UTF-8: {}", e);
        MetricsError::EncodingFailed
    })
}
