use crate::model::{DeviceId, DeviceRecord};
use std::collections::HashMap;

/// Read-mostly device directory used to label markers.
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: HashMap<DeviceId, DeviceRecord>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: DeviceRecord) {
        self.devices.insert(device.id, device);
    }

    pub fn find(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.devices.get(&id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices ordered by id.
    pub fn sorted(&self) -> Vec<&DeviceRecord> {
        let mut devices: Vec<_> = self.devices.values().collect();
        devices.sort_by_key(|device| device.id);
        devices
    }
}

impl FromIterator<DeviceRecord> for DeviceStore {
    fn from_iter<I: IntoIterator<Item = DeviceRecord>>(iter: I) -> Self {
        let mut store = DeviceStore::new();
        store.extend(iter);
        store
    }
}

impl Extend<DeviceRecord> for DeviceStore {
    fn extend<I: IntoIterator<Item = DeviceRecord>>(&mut self, iter: I) {
        for device in iter {
            self.insert(device);
        }
    }
}
