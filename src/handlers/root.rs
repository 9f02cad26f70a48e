//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"<li><a href="/health">/health</a> - scrape health statistics</li>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>supervisord exporter</title>
</head>
<body>
    <h1>supervisord exporter</h1>
    <p>Version {version} - uptime {uptime_str} - endpoint <code>{endpoint}</code></p>
    <ul>
        <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
        {health_link}
        <li><a href="/config">/config</a> - effective configuration</li>
    </ul>
</body>
</html>
"#,
        endpoint = state.config.endpoint(),
    ))
}
