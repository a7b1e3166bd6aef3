//! OS-level disk probing: filesystem usage via `statvfs` and per-device I/O
//! counters from `/proc/diskstats`.

use std::path::Path;

use diskmon_common::error::{DiskmonError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCounters {
    pub device: String,
    pub read_ops: u64,
    pub write_ops: u64,
}

/// Abstraction over the OS disk queries so the scrape path can be exercised
/// against a mock in tests.
pub trait DiskProbe: Send + Sync {
    fn disk_usage(&self, path: &Path) -> Result<DiskUsage>;
    fn io_counters(&self) -> Result<Vec<DeviceCounters>>;
}

/// Production probe backed by the real host OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }
}

impl DiskProbe for SystemProbe {
    #[cfg(unix)]
    fn disk_usage(&self, path: &Path) -> Result<DiskUsage> {
        let stat = nix::sys::statvfs::statvfs(path)
            .map_err(|err| DiskmonError::OsQuery(format!("statvfs {}: {err}", path.display())))?;

        let fragment_size = stat.fragment_size() as u64;
        let total_bytes = stat.blocks() as u64 * fragment_size;
        // Free is the space available to unprivileged users; used excludes
        // only the truly free blocks, so used + free may undershoot total by
        // the reserved blocks. This matches psutil's accounting.
        let free_bytes = stat.blocks_available() as u64 * fragment_size;
        let used_bytes = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64)
            * fragment_size;

        Ok(DiskUsage {
            total_bytes,
            used_bytes,
            free_bytes,
        })
    }

    #[cfg(not(unix))]
    fn disk_usage(&self, path: &Path) -> Result<DiskUsage> {
        Err(DiskmonError::OsQuery(format!(
            "disk usage for {} is not supported on this platform",
            path.display()
        )))
    }

    #[cfg(target_os = "linux")]
    fn io_counters(&self) -> Result<Vec<DeviceCounters>> {
        let diskstats = std::fs::read_to_string("/proc/diskstats")
            .map_err(|err| DiskmonError::OsQuery(format!("read /proc/diskstats: {err}")))?;
        Ok(parse_diskstats(&diskstats))
    }

    #[cfg(not(target_os = "linux"))]
    fn io_counters(&self) -> Result<Vec<DeviceCounters>> {
        Ok(Vec::new())
    }
}

/// Parses `/proc/diskstats` lines. Field layout per line: major, minor,
/// device name, then the I/O counters, of which fields 4 and 8 are reads and
/// writes completed. Malformed lines and virtual loop/ram devices are
/// skipped.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_diskstats(contents: &str) -> Vec<DeviceCounters> {
    let mut counters = Vec::new();

    for line in contents.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 14 {
            continue;
        }

        let device = fields[2];
        if device.starts_with("loop") || device.starts_with("ram") {
            continue;
        }

        let (Ok(read_ops), Ok(write_ops)) = (fields[3].parse::<u64>(), fields[7].parse::<u64>())
        else {
            continue;
        };

        counters.push(DeviceCounters {
            device: device.to_string(),
            read_ops,
            write_ops,
        });
    }

    counters
}

#[cfg(test)]
mod tests {
    use super::{DeviceCounters, parse_diskstats};

    const DISKSTATS: &str = "\
   8       0 sda 5 2 354 16 3 1 88 12 0 28 28 0 0 0 0 0 0
   8       1 sda1 331 1 23741 85 42 11 4526 116 0 100 201 0 0 0 0 0 0
   7       0 loop0 48 0 716 11 0 0 0 0 0 16 11 0 0 0 0 0 0
   1       0 ram0 10 0 80 1 0 0 0 0 0 1 1 0 0 0 0 0 0
 259       0 nvme0n1 73163 10 5821291 12897 180226 4 10817206 107918 0 78692 120815 0 0 0 0 0 0";

    #[test]
    fn parses_reads_and_writes_per_device() {
        let counters = parse_diskstats(DISKSTATS);
        assert_eq!(
            counters[0],
            DeviceCounters {
                device: "sda".to_string(),
                read_ops: 5,
                write_ops: 3,
            }
        );
        assert_eq!(counters[2].device, "nvme0n1");
        assert_eq!(counters[2].read_ops, 73163);
        assert_eq!(counters[2].write_ops, 180226);
    }

    #[test]
    fn skips_virtual_and_malformed_devices() {
        let counters = parse_diskstats(DISKSTATS);
        assert!(counters.iter().all(|c| c.device != "loop0" && c.device != "ram0"));

        assert!(parse_diskstats("8 0 sda 5 2\nnot a diskstats line\n").is_empty());
    }
}
