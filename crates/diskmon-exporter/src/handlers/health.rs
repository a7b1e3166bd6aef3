use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::router::ExporterState;

pub async fn health_live() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let probe = Arc::clone(&state.probe);
    let disk_path = state.config.disk_path.clone();
    // statvfs is blocking, so it goes off the runtime thread like the
    // scrape path does.
    let ready = tokio::task::spawn_blocking(move || probe.disk_usage(&disk_path).is_ok())
        .await
        .unwrap_or(false);
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ReadyResponse {
            ready,
            disk_path: state.config.disk_path.display().to_string(),
        }),
    )
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    disk_path: String,
}
