use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use trackcore::map::StyleConfig;

/// Settings of the map client, loaded from YAML.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:8082`.
    pub server: String,
    /// Upper bound for one request; long polls must fit inside it.
    pub request_timeout_secs: u64,
    /// Wait after a failed position request before polling again.
    pub failure_backoff_ms: u64,
    pub center_longitude: f64,
    pub center_latitude: f64,
    /// Metres per pixel at start-up.
    pub resolution: f64,
    pub style: StyleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8082".into(),
            request_timeout_secs: 60,
            failure_backoff_ms: 1_000,
            center_longitude: 13.405,
            center_latitude: 52.52,
            resolution: 10.0,
            style: StyleConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading client config {}", path_ref.display()))?;
        let config: ClientConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing client config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }
}
