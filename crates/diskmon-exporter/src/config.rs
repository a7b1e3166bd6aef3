use std::{path::PathBuf, time::Duration};

pub const DEFAULT_DISK_PATH: &str = "/";
pub const DEFAULT_DIRECTORY: &str = "/var/log/";
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;

/// Monitored targets and scrape limits, fixed at startup.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Mount path queried for free/used/total space.
    pub disk_path: PathBuf,
    /// Directory whose recursive file size is reported.
    pub directory: PathBuf,
    /// Wall-clock budget for a single scrape's OS queries and walk.
    pub scrape_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            scrape_timeout: Duration::from_secs(DEFAULT_SCRAPE_TIMEOUT_SECS),
        }
    }
}

impl ExporterConfig {
    /// Defaults with `DISKMON_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DISKMON_DISK_PATH")
            && !path.trim().is_empty()
        {
            config.disk_path = PathBuf::from(path);
        }

        if let Ok(directory) = std::env::var("DISKMON_DIRECTORY")
            && !directory.trim().is_empty()
        {
            config.directory = PathBuf::from(directory);
        }

        if let Ok(secs) = std::env::var("DISKMON_SCRAPE_TIMEOUT_SECS")
            && let Ok(secs) = secs.trim().parse::<u64>()
            && secs > 0
        {
            config.scrape_timeout = Duration::from_secs(secs);
        }

        config
    }
}
