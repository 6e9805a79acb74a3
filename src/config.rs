use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

pub const DEFAULT_BASE_URL: &str = "https://sampleapis.assimilate.be";
pub const DEFAULT_STORAGE_KEY: &str = "ufoReports";
pub const DEFAULT_USER_AGENT: &str = concat!("ufo-sightings/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the catalog API, without the `/ufo/sightings` path.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Directory holding the persisted local collection.
    pub data_dir: PathBuf,
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

/// Platform data directory, or the working directory when none is known.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("org", "ufo-sightings", "ufo-sightings")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.storage_key, "ufoReports");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_base_url("http://localhost:8080/")
            .with_timeout(Duration::from_secs(2))
            .with_data_dir("/tmp/ufo")
            .with_storage_key("reports");

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ufo"));
        assert_eq!(config.storage_key, "reports");
    }
}
