use crate::generator::fleet::FleetGenerator;
use crate::workflow::config::SimulationConfig;
use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use trackcore::model::{DeviceId, DeviceRecord, PositionRecord};

/// Backend state: the generator plus every fix it has produced so far.
pub struct Runner {
    config: SimulationConfig,
    generator: FleetGenerator,
    history: HashMap<DeviceId, Vec<PositionRecord>>,
    batches: usize,
}

impl Runner {
    pub fn new(config: SimulationConfig) -> anyhow::Result<Self> {
        let generator = FleetGenerator::new(config.to_generator_config(Utc::now()))
            .context("building fleet generator")?;
        Ok(Self {
            config,
            generator,
            history: HashMap::new(),
            batches: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.generator.devices()
    }

    /// Answers one long-poll request.
    ///
    /// `first` returns the latest fix of every device; otherwise the fleet
    /// advances one step and the new fixes are returned.
    pub fn poll(&mut self, first: bool) -> Vec<PositionRecord> {
        if first {
            if self.history.is_empty() {
                self.advance();
            }
            let mut latest: Vec<_> = self
                .history
                .values()
                .filter_map(|fixes| fixes.last().cloned())
                .collect();
            latest.sort_by_key(|record| record.device_id);
            return latest;
        }

        let mut batch = self.advance();
        if self.config.stale_every > 0 && self.batches % self.config.stale_every == 0 {
            if let Some(stale) = self.stale_fix(&batch) {
                batch.push(stale);
            }
        }
        batch
    }

    /// Historical fixes of one device in generation order.
    pub fn route(&self, device_id: DeviceId) -> Vec<PositionRecord> {
        self.history.get(&device_id).cloned().unwrap_or_default()
    }

    fn advance(&mut self) -> Vec<PositionRecord> {
        let batch = self.generator.step();
        for record in &batch {
            self.history
                .entry(record.device_id)
                .or_default()
                .push(record.clone());
        }
        self.batches += 1;
        batch
    }

    /// An already superseded fix of the first device in `batch`.
    fn stale_fix(&self, batch: &[PositionRecord]) -> Option<PositionRecord> {
        let device_id = batch.first()?.device_id;
        let fixes = self.history.get(&device_id)?;
        fixes.len().checked_sub(2).map(|index| fixes[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(stale_every: usize) -> Runner {
        let cfg = SimulationConfig {
            devices: 3,
            stale_every,
            ..Default::default()
        };
        Runner::new(cfg).unwrap()
    }

    #[test]
    fn first_poll_returns_snapshot_per_device() {
        let mut runner = runner(0);
        let snapshot = runner.poll(true);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(runner.poll(true), snapshot);
    }

    #[test]
    fn later_polls_advance_the_fleet() {
        let mut runner = runner(0);
        let snapshot = runner.poll(true);
        let next = runner.poll(false);
        assert_eq!(next.len(), 3);
        assert!(next[0].fix_time > snapshot[0].fix_time);
        assert_eq!(runner.route(1).len(), 2);
    }

    #[test]
    fn stale_fix_is_appended_periodically() {
        let mut runner = runner(2);
        runner.poll(true);
        let batch = runner.poll(false);
        assert_eq!(batch.len(), 4);

        let stale = batch.last().unwrap();
        let fresh = batch.iter().find(|r| r.device_id == stale.device_id).unwrap();
        assert!(stale.fix_time < fresh.fix_time);
    }

    #[test]
    fn unknown_device_has_empty_route() {
        let runner = runner(0);
        assert!(runner.route(99).is_empty());
    }
}
