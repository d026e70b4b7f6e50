use crate::model::{DeviceId, PositionRecord};
use std::collections::HashMap;

/// Result of reconciling one record into the latest-position store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Replaced,
    /// The record was older than the stored fix and was dropped.
    Stale,
}

impl ApplyOutcome {
    pub fn accepted(self) -> bool {
        !matches!(self, ApplyOutcome::Stale)
    }
}

/// Latest known position per device.
///
/// Holds at most one record per device and never lets a device's fix time
/// move backwards.
#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    latest: HashMap<DeviceId, PositionRecord>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `record.device_id`.
    ///
    /// Ties on fix time replace the stored record.
    pub fn apply(&mut self, record: &PositionRecord) -> ApplyOutcome {
        match self.latest.get_mut(&record.device_id) {
            Some(existing) if record.supersedes(existing) => {
                *existing = record.clone();
                ApplyOutcome::Replaced
            }
            Some(_) => ApplyOutcome::Stale,
            None => {
                self.latest.insert(record.device_id, record.clone());
                ApplyOutcome::Inserted
            }
        }
    }

    pub fn find_by_device(&self, device_id: DeviceId) -> Option<&PositionRecord> {
        self.latest.get(&device_id)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionRecord> {
        self.latest.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(device_id: DeviceId, secs: i64, longitude: f64) -> PositionRecord {
        PositionRecord::new(
            secs as u64,
            device_id,
            Utc.timestamp_opt(secs, 0).unwrap(),
            longitude,
            0.0,
            0.0,
        )
    }

    #[test]
    fn first_record_is_inserted() {
        let mut store = PositionStore::new();
        assert_eq!(store.apply(&fix(1, 10, 1.0)), ApplyOutcome::Inserted);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn older_record_leaves_store_unchanged() {
        let mut store = PositionStore::new();
        store.apply(&fix(1, 10, 1.0));
        assert_eq!(store.apply(&fix(1, 9, 2.0)), ApplyOutcome::Stale);

        let stored = store.find_by_device(1).unwrap();
        assert_eq!(stored.fix_time.timestamp(), 10);
        assert_eq!(stored.longitude, 1.0);
    }

    #[test]
    fn equal_fix_time_replaces() {
        let mut store = PositionStore::new();
        store.apply(&fix(1, 10, 1.0));
        assert_eq!(store.apply(&fix(1, 10, 5.0)), ApplyOutcome::Replaced);
        assert_eq!(store.find_by_device(1).unwrap().longitude, 5.0);
    }

    #[test]
    fn fix_time_never_regresses_over_a_sequence() {
        let mut store = PositionStore::new();
        let mut last_seen = i64::MIN;
        for secs in [5, 3, 8, 8, 2, 11, 7, 11, 20, 1] {
            store.apply(&fix(4, secs, secs as f64));
            let stored = store.find_by_device(4).unwrap().fix_time.timestamp();
            assert!(stored >= last_seen);
            last_seen = stored;
        }
        assert_eq!(last_seen, 20);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn devices_are_tracked_independently() {
        let mut store = PositionStore::new();
        store.apply(&fix(1, 10, 1.0));
        store.apply(&fix(2, 5, 2.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.find_by_device(2).unwrap().longitude, 2.0);
    }
}
