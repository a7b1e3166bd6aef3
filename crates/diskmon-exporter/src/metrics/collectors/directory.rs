use std::{path::Path, sync::Arc};

use diskmon_common::error::Result;
use tracing::debug;

use crate::metrics::registry::{GaugeMetric, MetricsRegistry};

/// Recursive size gauge for the monitored directory.
pub struct DirectoryMetrics {
    size_bytes: Arc<GaugeMetric>,
}

impl DirectoryMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            size_bytes: registry.register_gauge(
                "directory_size_bytes",
                "Size of the specific directory",
                &["directory"],
            )?,
        })
    }

    pub fn update(&self, directory: &Path, size_bytes: u64) -> Result<()> {
        self.size_bytes
            .set(&[&directory.display().to_string()], size_bytes as f64)
    }
}

/// Sums regular-file sizes under `path` recursively. Unreadable entries are
/// skipped so the result is a best-effort lower bound; symlinks are not
/// followed.
pub fn directory_size_bytes(path: &Path) -> u64 {
    let mut total = 0_u64;
    walk(path, &mut total);
    total
}

fn walk(path: &Path, total: &mut u64) {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        // DirEntry::metadata does not traverse symlinks, so link targets are
        // neither counted nor descended into.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if metadata.is_dir() {
            walk(&entry.path(), total);
        } else if metadata.is_file() {
            *total = total.saturating_add(metadata.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::directory_size_bytes;

    #[test]
    fn sums_file_sizes_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.log"), vec![0_u8; 10]).unwrap();
        fs::write(dir.path().join("b.log"), vec![0_u8; 20]).unwrap();

        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.log"), vec![0_u8; 30]).unwrap();

        assert_eq!(directory_size_bytes(dir.path()), 60);
    }

    #[test]
    fn missing_directory_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");

        assert_eq!(directory_size_bytes(&gone), 0);
    }

    #[test]
    fn empty_directory_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(directory_size_bytes(dir.path()), 0);
    }
}
