pub mod directory;
pub mod io;
pub mod usage;

use std::time::Instant;

use diskmon_common::error::Result;

use crate::{config::ExporterConfig, metrics::registry::MetricsRegistry, probe::DiskProbe};

pub use directory::DirectoryMetrics;
pub use io::DiskIoMetrics;
pub use usage::DiskUsageMetrics;

/// The exporter's fixed metric catalog plus the per-scrape refresh routine.
pub struct ExporterMetrics {
    usage: DiskUsageMetrics,
    directory: DirectoryMetrics,
    io: DiskIoMetrics,
}

impl ExporterMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            usage: DiskUsageMetrics::register(registry)?,
            directory: DirectoryMetrics::register(registry)?,
            io: DiskIoMetrics::register(registry)?,
        })
    }

    /// Repopulates every series from a fresh OS query and directory walk.
    /// Gauges are last-write-wins; the latency summary and histogram
    /// accumulate one sample per device and type per scrape, measuring
    /// cumulative rather than per-request statistics.
    pub fn refresh(&self, probe: &dyn DiskProbe, config: &ExporterConfig) -> Result<()> {
        let usage = probe.disk_usage(&config.disk_path)?;
        self.usage.update(&config.disk_path, &usage)?;

        let size = directory::directory_size_bytes(&config.directory);
        self.directory.update(&config.directory, size)?;

        let started = Instant::now();
        let counters = probe.io_counters()?;
        let latency_seconds = started.elapsed().as_secs_f64();
        self.io.update(&counters, latency_seconds)?;

        Ok(())
    }
}
