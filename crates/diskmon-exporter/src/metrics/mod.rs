pub mod collectors;
pub mod encoder;
pub mod registry;
pub mod types;

pub use collectors::{DirectoryMetrics, DiskIoMetrics, DiskUsageMetrics, ExporterMetrics};
pub use registry::{GaugeMetric, HistogramMetric, MetricsRegistry, SummaryMetric};
pub use types::{CollectedMetric, MetricDescriptor, MetricType, MetricValue};
