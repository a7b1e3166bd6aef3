use std::{fs, path::Path, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use diskmon_common::error::{DiskmonError, Result};
use diskmon_exporter::{
    config::ExporterConfig,
    probe::{DeviceCounters, DiskProbe, DiskUsage},
    router::{ExporterState, exporter_router},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

struct MockProbe {
    usage: Option<DiskUsage>,
    counters: Vec<DeviceCounters>,
}

impl MockProbe {
    fn healthy() -> Self {
        Self {
            usage: Some(DiskUsage {
                total_bytes: 150,
                used_bytes: 50,
                free_bytes: 100,
            }),
            counters: vec![DeviceCounters {
                device: "sda".to_string(),
                read_ops: 5,
                write_ops: 3,
            }],
        }
    }

    fn failing() -> Self {
        Self {
            usage: None,
            counters: Vec::new(),
        }
    }
}

impl DiskProbe for MockProbe {
    fn disk_usage(&self, _path: &Path) -> Result<DiskUsage> {
        self.usage
            .ok_or_else(|| DiskmonError::OsQuery("statvfs /: permission denied".to_string()))
    }

    fn io_counters(&self) -> Result<Vec<DeviceCounters>> {
        Ok(self.counters.clone())
    }
}

struct SlowProbe;

impl DiskProbe for SlowProbe {
    fn disk_usage(&self, _path: &Path) -> Result<DiskUsage> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(DiskUsage {
            total_bytes: 1,
            used_bytes: 0,
            free_bytes: 1,
        })
    }

    fn io_counters(&self) -> Result<Vec<DeviceCounters>> {
        Ok(Vec::new())
    }
}

fn test_state(probe: MockProbe, directory: &Path) -> Arc<ExporterState> {
    let config = ExporterConfig {
        disk_path: "/".into(),
        directory: directory.to_path_buf(),
        scrape_timeout: Duration::from_secs(5),
    };
    Arc::new(ExporterState::new(Arc::new(probe), config).unwrap())
}

async fn get(state: Arc<ExporterState>, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = exporter_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn scrape_reports_usage_directory_and_io_metrics() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), vec![0_u8; 10]).unwrap();
    fs::write(dir.path().join("b.log"), vec![0_u8; 20]).unwrap();
    fs::write(dir.path().join("c.log"), vec![0_u8; 30]).unwrap();

    let state = test_state(MockProbe::healthy(), dir.path());
    let (status, content_type, body) = get(state, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain; version=0.0.4"));

    assert!(body.contains("disk_free_space_bytes{path=\"/\"} 100\n"));
    assert!(body.contains("disk_used_space_bytes{path=\"/\"} 50\n"));
    assert!(body.contains("disk_total_space_bytes{path=\"/\"} 150\n"));

    let directory_line = format!(
        "directory_size_bytes{{directory=\"{}\"}} 60\n",
        dir.path().display()
    );
    assert!(body.contains(&directory_line));

    assert!(body.contains("disk_io_operations_total{device=\"sda\",type=\"read\"} 5\n"));
    assert!(body.contains("disk_io_operations_total{device=\"sda\",type=\"write\"} 3\n"));
    assert!(body.contains("disk_read_operations_total{device=\"sda\"} 5\n"));
    assert!(body.contains("disk_write_operations_total{device=\"sda\"} 3\n"));

    assert!(body.contains("# TYPE disk_latency_seconds summary\n"));
    assert!(body.contains("disk_latency_seconds_count{device=\"sda\",type=\"read\"} 1\n"));
    assert!(body.contains("disk_latency_seconds_count{device=\"sda\",type=\"write\"} 1\n"));
    assert!(body.contains("# TYPE disk_latency_histogram_seconds histogram\n"));
    assert!(body.contains(
        "disk_latency_histogram_seconds_bucket{device=\"sda\",type=\"read\",le=\"+Inf\"} 1\n"
    ));
}

#[tokio::test]
async fn latency_instruments_accumulate_across_scrapes() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(MockProbe::healthy(), dir.path());

    let (status, _, _) = get(Arc::clone(&state), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = get(state, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    // Gauges are latest-wins; the summary and histogram measure cumulative
    // statistics, one sample per device and type per scrape.
    assert!(body.contains("disk_read_operations_total{device=\"sda\"} 5\n"));
    assert!(body.contains("disk_latency_seconds_count{device=\"sda\",type=\"read\"} 2\n"));
    assert!(body.contains(
        "disk_latency_histogram_seconds_bucket{device=\"sda\",type=\"write\",le=\"+Inf\"} 2\n"
    ));
}

#[tokio::test]
async fn failing_probe_yields_500_and_no_metrics_body() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(MockProbe::failing(), dir.path());

    let (status, _, body) = get(state, "/metrics").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("scrape failed:"));
    assert!(!body.contains("# HELP"));
}

#[tokio::test]
async fn slow_scrape_times_out_with_500_and_no_metrics_body() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExporterConfig {
        disk_path: "/".into(),
        directory: dir.path().to_path_buf(),
        scrape_timeout: Duration::from_millis(50),
    };
    let state = Arc::new(ExporterState::new(Arc::new(SlowProbe), config).unwrap());

    let (status, _, body) = get(state, "/metrics").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("scrape failed:"));
    assert!(body.contains("timed out"));
    assert!(!body.contains("# HELP"));
}

#[tokio::test]
async fn readiness_follows_probe_health() {
    let dir = tempfile::tempdir().unwrap();

    let state = test_state(MockProbe::healthy(), dir.path());
    let (status, _, _) = get(state, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    let state = test_state(MockProbe::failing(), dir.path());
    let (status, _, _) = get(state, "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let state = test_state(MockProbe::failing(), dir.path());
    let (status, _, _) = get(state, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
}
