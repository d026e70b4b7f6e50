use super::device::DeviceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PositionId = u64;

/// A single position fix reported for a device.
///
/// Live batches key records by `device_id`; historical reports key them by
/// `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    #[serde(default)]
    pub id: PositionId,
    pub device_id: DeviceId,
    pub fix_time: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    /// Heading in degrees, 0-360.
    #[serde(default)]
    pub course: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub altitude: f64,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl PositionRecord {
    pub fn new(
        id: PositionId,
        device_id: DeviceId,
        fix_time: DateTime<Utc>,
        longitude: f64,
        latitude: f64,
        course: f64,
    ) -> Self {
        Self {
            id,
            device_id,
            fix_time,
            longitude,
            latitude,
            course,
            speed: 0.0,
            altitude: 0.0,
            valid: true,
            attributes: BTreeMap::new(),
        }
    }

    /// True when this fix may replace `existing` in the latest-position store.
    pub fn supersedes(&self, existing: &PositionRecord) -> bool {
        self.fix_time >= existing.fix_time
    }
}
