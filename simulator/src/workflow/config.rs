use crate::generator::fleet::GeneratorConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub devices: usize,
    pub seed: u64,
    pub origin_longitude: f64,
    pub origin_latitude: f64,
    /// Half-width of the box devices roam in, degrees.
    pub spread_deg: f64,
    pub speed_kmh: f64,
    /// Simulated and wall-clock seconds between two fixes.
    pub step_secs: u64,
    /// Every n-th batch repeats an older fix of the first device; 0 disables.
    pub stale_every: usize,
    pub port: u16,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            devices: 5,
            seed: 7,
            origin_longitude: 13.405,
            origin_latitude: 52.52,
            spread_deg: 0.05,
            speed_kmh: 40.0,
            step_secs: 2,
            stale_every: 10,
            port: 8082,
        }
    }
}

impl SimulationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulation config {}", path_ref.display()))?;
        let config: SimulationConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulation config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(devices: usize, seed: u64, port: u16) -> Self {
        Self {
            devices,
            seed,
            port,
            ..Default::default()
        }
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_secs(self.step_secs)
    }

    pub fn to_generator_config(&self, start: DateTime<Utc>) -> GeneratorConfig {
        GeneratorConfig {
            devices: self.devices,
            seed: self.seed,
            origin_longitude: self.origin_longitude,
            origin_latitude: self.origin_latitude,
            spread_deg: self.spread_deg,
            speed_kmh: self.speed_kmh,
            step_secs: self.step_secs,
            start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_defaults() {
        let cfg = SimulationConfig::from_args(3, 11, 9100);
        assert_eq!(cfg.devices, 3);
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.step_interval(), Duration::from_secs(2));
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"devices: 12\nseed: 3\nstale_every: 0\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = SimulationConfig::load(&path).unwrap();
        assert_eq!(cfg.devices, 12);
        assert_eq!(cfg.stale_every, 0);
        assert_eq!(cfg.port, 8082);
    }
}
