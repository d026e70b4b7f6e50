use crate::store::ApplyOutcome;
use std::sync::Mutex;

/// Counters describing how the live feed has been reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub batches: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub stale: usize,
    pub markers_created: usize,
    pub unknown_devices: usize,
    pub transport_failures: usize,
    pub discarded: usize,
}

#[derive(Debug, Default)]
pub struct FeedMetrics {
    inner: Mutex<FeedSnapshot>,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, apply: impl FnOnce(&mut FeedSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_batch(&self) {
        self.update(|m| m.batches += 1);
    }

    pub fn record_apply(&self, outcome: ApplyOutcome) {
        self.update(|m| match outcome {
            ApplyOutcome::Inserted => m.inserted += 1,
            ApplyOutcome::Replaced => m.replaced += 1,
            ApplyOutcome::Stale => m.stale += 1,
        });
    }

    pub fn record_marker_created(&self) {
        self.update(|m| m.markers_created += 1);
    }

    pub fn record_unknown_device(&self) {
        self.update(|m| m.unknown_devices += 1);
    }

    pub fn record_transport_failure(&self) {
        self.update(|m| m.transport_failures += 1);
    }

    pub fn record_discarded(&self) {
        self.update(|m| m.discarded += 1);
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_outcomes_are_counted_separately() {
        let metrics = FeedMetrics::new();
        metrics.record_apply(ApplyOutcome::Inserted);
        metrics.record_apply(ApplyOutcome::Stale);
        metrics.record_apply(ApplyOutcome::Stale);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inserted, 1);
        assert_eq!(snapshot.replaced, 0);
        assert_eq!(snapshot.stale, 2);
    }
}
