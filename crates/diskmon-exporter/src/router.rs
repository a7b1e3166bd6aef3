use std::sync::Arc;

use axum::{Router, routing::get};
use diskmon_common::error::Result;

use crate::{
    config::ExporterConfig,
    handlers,
    metrics::{ExporterMetrics, MetricsRegistry},
    probe::DiskProbe,
};

/// Shared per-process state: the registry, the catalog handles, and the OS
/// probe. Built once at startup and handed to every request.
pub struct ExporterState {
    pub config: ExporterConfig,
    pub registry: Arc<MetricsRegistry>,
    pub metrics: Arc<ExporterMetrics>,
    pub probe: Arc<dyn DiskProbe>,
}

impl ExporterState {
    pub fn new(probe: Arc<dyn DiskProbe>, config: ExporterConfig) -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        let metrics = Arc::new(ExporterMetrics::register(registry.as_ref())?);

        Ok(Self {
            config,
            registry,
            metrics,
            probe,
        })
    }
}

pub fn exporter_router(state: Arc<ExporterState>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .route("/health/live", get(handlers::health::health_live))
        .route("/health/ready", get(handlers::health::health_ready))
        .with_state(state)
}
