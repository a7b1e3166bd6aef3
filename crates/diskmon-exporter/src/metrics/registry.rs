use std::sync::{
    Arc, Mutex, RwLock,
    atomic::{AtomicU64, Ordering},
};

use diskmon_common::error::{DiskmonError, Result};

use crate::metrics::types::{
    CollectedMetric, MetricDescriptor, MetricSample, MetricType, MetricValue,
};

type LabelValues = Vec<String>;

trait RegisteredMetric: Send + Sync {
    fn descriptor(&self) -> MetricDescriptor;
    fn collect(&self) -> Result<Vec<MetricSample>>;
}

/// Holds every declared metric in declaration order. Series under a metric
/// are created lazily on first observation and are never evicted.
pub struct MetricsRegistry {
    metrics: RwLock<Vec<Arc<dyn RegisteredMetric>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(Vec::new()),
        }
    }

    pub fn register_gauge(
        &self,
        name: &str,
        help: &str,
        variable_labels: &[&str],
    ) -> Result<Arc<GaugeMetric>> {
        let metric = Arc::new(GaugeMetric::new(name, help, variable_labels));
        self.register(metric.clone())?;
        Ok(metric)
    }

    pub fn register_summary(
        &self,
        name: &str,
        help: &str,
        variable_labels: &[&str],
    ) -> Result<Arc<SummaryMetric>> {
        let metric = Arc::new(SummaryMetric::new(name, help, variable_labels));
        self.register(metric.clone())?;
        Ok(metric)
    }

    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        variable_labels: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<HistogramMetric>> {
        let metric = Arc::new(HistogramMetric::new(name, help, variable_labels, buckets));
        self.register(metric.clone())?;
        Ok(metric)
    }

    /// Collects a consistent view of every metric and all of its series,
    /// metrics in declaration order, series in first-observed order.
    pub fn snapshot(&self) -> Result<Vec<CollectedMetric>> {
        let metrics = self
            .metrics
            .read()
            .map_err(|_| DiskmonError::InternalError("metrics registry lock poisoned".to_string()))?;

        metrics
            .iter()
            .map(|metric| {
                Ok(CollectedMetric {
                    descriptor: metric.descriptor(),
                    samples: metric.collect()?,
                })
            })
            .collect()
    }

    fn register<M: RegisteredMetric + 'static>(&self, metric: Arc<M>) -> Result<()> {
        let name = metric.descriptor().name;
        let mut metrics = self
            .metrics
            .write()
            .map_err(|_| DiskmonError::InternalError("metrics registry lock poisoned".to_string()))?;

        if metrics
            .iter()
            .any(|existing| existing.descriptor().name == name)
        {
            return Err(DiskmonError::DuplicateMetric(name));
        }

        metrics.push(metric);
        Ok(())
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time float value per label set, last write wins.
pub struct GaugeMetric {
    descriptor: MetricDescriptor,
    series: RwLock<Vec<(LabelValues, Arc<AtomicU64>)>>,
}

impl GaugeMetric {
    fn new(name: &str, help: &str, variable_labels: &[&str]) -> Self {
        Self {
            descriptor: MetricDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                metric_type: MetricType::Gauge,
                variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
            },
            series: RwLock::new(Vec::new()),
        }
    }

    pub fn set(&self, labels: &[&str], value: f64) -> Result<()> {
        let label_values = validate_labels(&self.descriptor, labels)?;
        let series = get_or_create_series(&self.descriptor, &self.series, label_values, || {
            Arc::new(AtomicU64::new(0_f64.to_bits()))
        })?;
        series.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

impl RegisteredMetric for GaugeMetric {
    fn descriptor(&self) -> MetricDescriptor {
        self.descriptor.clone()
    }

    fn collect(&self) -> Result<Vec<MetricSample>> {
        let series = read_series(&self.descriptor, &self.series)?;

        Ok(series
            .iter()
            .map(|(label_values, value)| MetricSample {
                labels: materialize_labels(&self.descriptor, label_values),
                value: MetricValue::Gauge(f64::from_bits(value.load(Ordering::Relaxed))),
            })
            .collect())
    }
}

/// Running count and sum of observed samples, no quantiles.
#[derive(Debug)]
pub struct SummaryMetric {
    descriptor: MetricDescriptor,
    series: RwLock<Vec<(LabelValues, Arc<Mutex<SummarySeries>>)>>,
}

#[derive(Debug, Default)]
struct SummarySeries {
    count: u64,
    sum: f64,
}

impl SummaryMetric {
    fn new(name: &str, help: &str, variable_labels: &[&str]) -> Self {
        Self {
            descriptor: MetricDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                metric_type: MetricType::Summary,
                variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
            },
            series: RwLock::new(Vec::new()),
        }
    }

    pub fn observe(&self, labels: &[&str], sample: f64) -> Result<()> {
        let label_values = validate_labels(&self.descriptor, labels)?;
        let series = get_or_create_series(&self.descriptor, &self.series, label_values, || {
            Arc::new(Mutex::new(SummarySeries::default()))
        })?;

        let mut entry = series
            .lock()
            .map_err(|_| series_lock_poisoned(&self.descriptor))?;
        entry.count += 1;
        entry.sum += sample;
        Ok(())
    }
}

impl RegisteredMetric for SummaryMetric {
    fn descriptor(&self) -> MetricDescriptor {
        self.descriptor.clone()
    }

    fn collect(&self) -> Result<Vec<MetricSample>> {
        let series = read_series(&self.descriptor, &self.series)?;

        series
            .iter()
            .map(|(label_values, entry)| {
                let entry = entry
                    .lock()
                    .map_err(|_| series_lock_poisoned(&self.descriptor))?;
                Ok(MetricSample {
                    labels: materialize_labels(&self.descriptor, label_values),
                    value: MetricValue::Summary {
                        count: entry.count,
                        sum: entry.sum,
                    },
                })
            })
            .collect()
    }
}

/// Samples bucketed by ascending upper bound, plus overall count and sum.
pub struct HistogramMetric {
    descriptor: MetricDescriptor,
    buckets: Vec<f64>,
    series: RwLock<Vec<(LabelValues, Arc<Mutex<HistogramSeries>>)>>,
}

struct HistogramSeries {
    bucket_counts: Vec<u64>,
    count: u64,
    sum: f64,
}

impl HistogramMetric {
    fn new(name: &str, help: &str, variable_labels: &[&str], buckets: &[f64]) -> Self {
        let mut sorted_buckets = buckets.to_vec();
        sorted_buckets.sort_by(|left, right| left.total_cmp(right));

        Self {
            descriptor: MetricDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                metric_type: MetricType::Histogram,
                variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
            },
            buckets: sorted_buckets,
            series: RwLock::new(Vec::new()),
        }
    }

    pub fn observe(&self, labels: &[&str], sample: f64) -> Result<()> {
        let label_values = validate_labels(&self.descriptor, labels)?;
        let bucket_count = self.buckets.len();
        let series = get_or_create_series(&self.descriptor, &self.series, label_values, || {
            Arc::new(Mutex::new(HistogramSeries {
                bucket_counts: vec![0; bucket_count + 1],
                count: 0,
                sum: 0.0,
            }))
        })?;

        let bucket_index = self
            .buckets
            .iter()
            .position(|bucket| sample <= *bucket)
            .unwrap_or(self.buckets.len());

        let mut entry = series
            .lock()
            .map_err(|_| series_lock_poisoned(&self.descriptor))?;
        entry.bucket_counts[bucket_index] += 1;
        entry.count += 1;
        entry.sum += sample;
        Ok(())
    }
}

impl RegisteredMetric for HistogramMetric {
    fn descriptor(&self) -> MetricDescriptor {
        self.descriptor.clone()
    }

    fn collect(&self) -> Result<Vec<MetricSample>> {
        let series = read_series(&self.descriptor, &self.series)?;

        series
            .iter()
            .map(|(label_values, entry)| {
                let entry = entry
                    .lock()
                    .map_err(|_| series_lock_poisoned(&self.descriptor))?;

                let mut buckets = self
                    .buckets
                    .iter()
                    .enumerate()
                    .map(|(index, bound)| (*bound, entry.bucket_counts[index]))
                    .collect::<Vec<_>>();
                buckets.push((f64::INFINITY, entry.bucket_counts[self.buckets.len()]));

                Ok(MetricSample {
                    labels: materialize_labels(&self.descriptor, label_values),
                    value: MetricValue::Histogram {
                        buckets,
                        count: entry.count,
                        sum: entry.sum,
                    },
                })
            })
            .collect()
    }
}

fn validate_labels(descriptor: &MetricDescriptor, labels: &[&str]) -> Result<LabelValues> {
    let expected = descriptor.variable_labels.len();
    if labels.len() != expected {
        return Err(DiskmonError::LabelArity {
            metric: descriptor.name.clone(),
            expected,
            got: labels.len(),
        });
    }
    Ok(labels.iter().map(|value| (*value).to_string()).collect())
}

fn materialize_labels(descriptor: &MetricDescriptor, values: &[String]) -> Vec<(String, String)> {
    descriptor
        .variable_labels
        .iter()
        .zip(values.iter())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn read_series<'a, S>(
    descriptor: &MetricDescriptor,
    series: &'a RwLock<Vec<(LabelValues, S)>>,
) -> Result<std::sync::RwLockReadGuard<'a, Vec<(LabelValues, S)>>> {
    series.read().map_err(|_| series_lock_poisoned(descriptor))
}

fn get_or_create_series<S: Clone>(
    descriptor: &MetricDescriptor,
    series: &RwLock<Vec<(LabelValues, S)>>,
    label_values: LabelValues,
    create: impl FnOnce() -> S,
) -> Result<S> {
    if let Ok(guard) = series.read()
        && let Some((_, existing)) = guard.iter().find(|(values, _)| *values == label_values)
    {
        return Ok(existing.clone());
    }

    let mut guard = series
        .write()
        .map_err(|_| series_lock_poisoned(descriptor))?;
    if let Some((_, existing)) = guard.iter().find(|(values, _)| *values == label_values) {
        return Ok(existing.clone());
    }

    let created = create();
    guard.push((label_values, created.clone()));
    Ok(created)
}

fn series_lock_poisoned(descriptor: &MetricDescriptor) -> DiskmonError {
    DiskmonError::InternalError(format!("series lock poisoned for {}", descriptor.name))
}
