use std::{path::Path, sync::Arc};

use diskmon_common::error::Result;

use crate::{
    metrics::registry::{GaugeMetric, MetricsRegistry},
    probe::DiskUsage,
};

/// Filesystem usage gauges for the monitored mount path.
pub struct DiskUsageMetrics {
    free_space_bytes: Arc<GaugeMetric>,
    used_space_bytes: Arc<GaugeMetric>,
    total_space_bytes: Arc<GaugeMetric>,
}

impl DiskUsageMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            free_space_bytes: registry.register_gauge(
                "disk_free_space_bytes",
                "Free space of the disk",
                &["path"],
            )?,
            used_space_bytes: registry.register_gauge(
                "disk_used_space_bytes",
                "Used space of the disk",
                &["path"],
            )?,
            total_space_bytes: registry.register_gauge(
                "disk_total_space_bytes",
                "Total space of the disk",
                &["path"],
            )?,
        })
    }

    pub fn update(&self, path: &Path, usage: &DiskUsage) -> Result<()> {
        let path = path.display().to_string();
        self.free_space_bytes
            .set(&[&path], usage.free_bytes as f64)?;
        self.used_space_bytes
            .set(&[&path], usage.used_bytes as f64)?;
        self.total_space_bytes
            .set(&[&path], usage.total_bytes as f64)?;
        Ok(())
    }
}
