use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use diskmon_common::error::DiskmonError;
use tracing::warn;

use crate::{metrics::encoder, router::ExporterState};

/// Serves a scrape: refreshes every series from the OS, then renders the
/// snapshot. Any failure, including a scrape timeout, yields a plain 500
/// diagnostic rather than a partial metrics page.
pub async fn prometheus_metrics(State(state): State<Arc<ExporterState>>) -> Response {
    let metrics = Arc::clone(&state.metrics);
    let probe = Arc::clone(&state.probe);
    let config = state.config.clone();
    let timeout = config.scrape_timeout;

    let refresh = tokio::task::spawn_blocking(move || metrics.refresh(probe.as_ref(), &config));

    let refreshed = match tokio::time::timeout(timeout, refresh).await {
        Err(_) => Err(DiskmonError::ScrapeTimeout(timeout)),
        Ok(Err(join_error)) => Err(DiskmonError::InternalError(format!(
            "scrape task failed: {join_error}"
        ))),
        Ok(Ok(result)) => result,
    };

    let payload = match refreshed.and_then(|()| state.registry.snapshot()) {
        Ok(snapshot) => encoder::render(&snapshot),
        Err(err) => {
            warn!(error = %err, "scrape failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("scrape failed: {err}\n"),
            )
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(payload));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(encoder::CONTENT_TYPE),
    );

    response
}
