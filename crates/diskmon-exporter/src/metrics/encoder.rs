//! Prometheus text exposition format (version 0.0.4) rendering.
//!
//! Output is a pure function of the snapshot: no timestamps are appended, so
//! encoding an unchanged snapshot twice yields byte-identical text.

use crate::metrics::types::{CollectedMetric, MetricValue};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn render(metrics: &[CollectedMetric]) -> String {
    let mut output = String::new();

    for metric in metrics {
        output.push_str("# HELP ");
        output.push_str(&metric.descriptor.name);
        output.push(' ');
        output.push_str(&escape_help(&metric.descriptor.help));
        output.push('\n');

        output.push_str("# TYPE ");
        output.push_str(&metric.descriptor.name);
        output.push(' ');
        output.push_str(metric.descriptor.metric_type.as_prometheus_type());
        output.push('\n');

        for sample in &metric.samples {
            match &sample.value {
                MetricValue::Gauge(value) => {
                    output.push_str(&render_sample_line(
                        &metric.descriptor.name,
                        &sample.labels,
                        &format_metric_value(*value),
                    ));
                }
                MetricValue::Summary { count, sum } => {
                    output.push_str(&render_sample_line(
                        &format!("{}_sum", metric.descriptor.name),
                        &sample.labels,
                        &format_metric_value(*sum),
                    ));
                    output.push_str(&render_sample_line(
                        &format!("{}_count", metric.descriptor.name),
                        &sample.labels,
                        &count.to_string(),
                    ));
                }
                MetricValue::Histogram {
                    buckets,
                    count,
                    sum,
                } => {
                    let mut cumulative = 0_u64;
                    for (bound, bucket_count) in buckets {
                        cumulative = cumulative.saturating_add(*bucket_count);
                        let mut labels = sample.labels.clone();
                        labels.push(("le".to_string(), format_bucket_bound(*bound)));
                        output.push_str(&render_sample_line(
                            &format!("{}_bucket", metric.descriptor.name),
                            &labels,
                            &cumulative.to_string(),
                        ));
                    }

                    output.push_str(&render_sample_line(
                        &format!("{}_sum", metric.descriptor.name),
                        &sample.labels,
                        &format_metric_value(*sum),
                    ));
                    output.push_str(&render_sample_line(
                        &format!("{}_count", metric.descriptor.name),
                        &sample.labels,
                        &count.to_string(),
                    ));
                }
            }
        }
    }

    output
}

fn render_sample_line(name: &str, labels: &[(String, String)], value: &str) -> String {
    let mut rendered = String::new();
    rendered.push_str(name);

    if !labels.is_empty() {
        rendered.push('{');
        for (index, (key, label_value)) in labels.iter().enumerate() {
            if index > 0 {
                rendered.push(',');
            }
            rendered.push_str(key);
            rendered.push_str("=\"");
            rendered.push_str(&escape_label_value(label_value));
            rendered.push('"');
        }
        rendered.push('}');
    }

    rendered.push(' ');
    rendered.push_str(value);
    rendered.push('\n');
    rendered
}

fn format_metric_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn format_bucket_bound(value: f64) -> String {
    if value.is_infinite() {
        "+Inf".to_string()
    } else {
        value.to_string()
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
