use std::sync::Arc;

use diskmon_common::error::Result;

use crate::{
    metrics::registry::{GaugeMetric, HistogramMetric, MetricsRegistry, SummaryMetric},
    probe::DeviceCounters,
};

/// Default latency buckets, 5ms to 10s.
const LATENCY_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Per-device I/O operation gauges and scrape latency instruments.
pub struct DiskIoMetrics {
    io_operations: Arc<GaugeMetric>,
    read_operations: Arc<GaugeMetric>,
    write_operations: Arc<GaugeMetric>,
    latency: Arc<SummaryMetric>,
    latency_histogram: Arc<HistogramMetric>,
}

impl DiskIoMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            io_operations: registry.register_gauge(
                "disk_io_operations_total",
                "Total number of disk I/O operations",
                &["device", "type"],
            )?,
            read_operations: registry.register_gauge(
                "disk_read_operations_total",
                "Total number of disk read operations",
                &["device"],
            )?,
            write_operations: registry.register_gauge(
                "disk_write_operations_total",
                "Total number of disk write operations",
                &["device"],
            )?,
            latency: registry.register_summary(
                "disk_latency_seconds",
                "Summary of disk I/O operation latency",
                &["device", "type"],
            )?,
            latency_histogram: registry.register_histogram(
                "disk_latency_histogram_seconds",
                "Histogram of disk I/O operation latency",
                &["device", "type"],
                &LATENCY_BUCKETS,
            )?,
        })
    }

    /// Sets the cumulative op-count gauges for each device and records the
    /// measured counter-query latency once per device for both operation
    /// types, the same sample feeding the summary and the histogram.
    pub fn update(&self, counters: &[DeviceCounters], latency_seconds: f64) -> Result<()> {
        for device in counters {
            self.io_operations
                .set(&[&device.device, "read"], device.read_ops as f64)?;
            self.io_operations
                .set(&[&device.device, "write"], device.write_ops as f64)?;
            self.read_operations
                .set(&[&device.device], device.read_ops as f64)?;
            self.write_operations
                .set(&[&device.device], device.write_ops as f64)?;

            for operation_type in ["read", "write"] {
                self.latency
                    .observe(&[&device.device, operation_type], latency_seconds)?;
                self.latency_histogram
                    .observe(&[&device.device, operation_type], latency_seconds)?;
            }
        }
        Ok(())
    }
}
