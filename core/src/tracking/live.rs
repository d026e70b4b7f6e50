use super::controller::{BatchSummary, MapController};
use crate::model::PositionRecord;
use crate::prelude::{MapSurface, PositionTransport, Projection, TransportError};
use crate::telemetry::LogManager;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied(BatchSummary),
    /// The request failed; the next iteration will try again.
    Failed,
    /// The response arrived after the loop was stopped.
    Discarded,
}

/// Handle that stops a [`LiveUpdates`] loop.
#[derive(Debug)]
pub struct LiveStop {
    tx: watch::Sender<bool>,
}

impl LiveStop {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Polling loop feeding position batches into a [`MapController`].
///
/// Each response is applied completely before the next request goes out.
/// Hosts that schedule requests themselves drive [`next_request`] and
/// [`accept`] directly instead of [`run`].
///
/// [`next_request`]: LiveUpdates::next_request
/// [`accept`]: LiveUpdates::accept
/// [`run`]: LiveUpdates::run
#[derive(Debug)]
pub struct LiveUpdates {
    first: bool,
    stop: watch::Receiver<bool>,
    failure_backoff: Duration,
    logger: LogManager,
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            // Handle dropped without stopping; only dropping the loop ends it.
            std::future::pending::<()>().await;
        }
    }
}

impl LiveUpdates {
    /// `failure_backoff` is waited after a failed request only; zero retries
    /// immediately.
    pub fn new(failure_backoff: Duration) -> (Self, LiveStop) {
        let (tx, rx) = watch::channel(false);
        let live = Self {
            first: true,
            stop: rx,
            failure_backoff,
            logger: LogManager::new("live"),
        };
        (live, LiveStop { tx })
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// `first` flag for the next request, or `None` once stopped.
    pub fn next_request(&mut self) -> Option<bool> {
        if self.is_stopped() {
            return None;
        }
        Some(std::mem::replace(&mut self.first, false))
    }

    /// Applies one response. Failures are logged and swallowed.
    pub fn accept<S: MapSurface, P: Projection>(
        &self,
        response: Result<Vec<PositionRecord>, TransportError>,
        controller: &mut MapController<S, P>,
    ) -> PollOutcome {
        if self.is_stopped() {
            controller.metrics().record_discarded();
            self.logger.trace("response after stop discarded");
            return PollOutcome::Discarded;
        }

        match response {
            Ok(batch) => PollOutcome::Applied(controller.apply_batch(&batch)),
            Err(err) => {
                controller.metrics().record_transport_failure();
                self.logger.anomaly(&format!("position request failed: {}", err));
                PollOutcome::Failed
            }
        }
    }

    /// Polls until stopped. A request in flight when the stop arrives is
    /// dropped unapplied.
    pub async fn run<T, S, P>(mut self, transport: &T, controller: &mut MapController<S, P>)
    where
        T: PositionTransport,
        S: MapSurface,
        P: Projection,
    {
        self.logger.record("live updates started");

        while let Some(first) = self.next_request() {
            let response = tokio::select! {
                response = transport.fetch_updates(first) => response,
                _ = stopped(self.stop.clone()) => break,
            };

            let outcome = self.accept(response, controller);
            if outcome == PollOutcome::Failed && !self.failure_backoff.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.failure_backoff) => {}
                    _ = stopped(self.stop.clone()) => break,
                }
            }
        }

        self.logger.record("live updates stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{StyleConfig, VectorLayer, WebMercator};
    use crate::model::DeviceRecord;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    type Response = Result<Vec<PositionRecord>, TransportError>;

    /// Replays canned responses, then stops the loop and hangs.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Response>>,
        requests: Mutex<Vec<bool>>,
        stop: LiveStop,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Response>, stop: LiveStop) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
                stop,
            }
        }

        fn requests(&self) -> Vec<bool> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl PositionTransport for ScriptedTransport {
        fn fetch_updates(&self, first: bool) -> impl Future<Output = Response> + Send {
            self.requests.lock().unwrap().push(first);
            let next = self.script.lock().unwrap().pop_front();
            if next.is_none() {
                self.stop.stop();
            }
            async move {
                match next {
                    Some(response) => response,
                    None => std::future::pending().await,
                }
            }
        }
    }

    fn controller() -> MapController<VectorLayer, WebMercator> {
        let devices = [DeviceRecord::new(1, "Truck 1")].into_iter().collect();
        MapController::new(VectorLayer::default(), WebMercator, StyleConfig::default(), devices)
    }

    fn fix(secs: i64, longitude: f64) -> PositionRecord {
        PositionRecord::new(0, 1, Utc.timestamp_opt(secs, 0).unwrap(), longitude, 0.0, 0.0)
    }

    #[test]
    fn first_flag_is_set_once() {
        let (mut live, _stop) = LiveUpdates::new(Duration::ZERO);
        assert_eq!(live.next_request(), Some(true));
        assert_eq!(live.next_request(), Some(false));
        assert_eq!(live.next_request(), Some(false));
    }

    #[test]
    fn stopped_loop_issues_no_requests() {
        let (mut live, stop) = LiveUpdates::new(Duration::ZERO);
        stop.stop();
        assert_eq!(live.next_request(), None);
    }

    #[test]
    fn late_response_is_not_applied() {
        let (live, stop) = LiveUpdates::new(Duration::ZERO);
        let mut controller = controller();
        stop.stop();

        let outcome = live.accept(Ok(vec![fix(10, 1.0)]), &mut controller);
        assert_eq!(outcome, PollOutcome::Discarded);
        assert!(controller.positions().is_empty());
        assert_eq!(controller.metrics().snapshot().discarded, 1);
    }

    #[test]
    fn failure_is_swallowed() {
        let (live, _stop) = LiveUpdates::new(Duration::ZERO);
        let mut controller = controller();
        let outcome = live.accept(Err(TransportError::Status(502)), &mut controller);
        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(controller.metrics().snapshot().transport_failures, 1);
    }

    #[tokio::test]
    async fn loop_applies_batches_in_order_and_survives_failures() {
        let (live, stop) = LiveUpdates::new(Duration::ZERO);
        let transport = ScriptedTransport::new(
            vec![
                Ok(vec![fix(10, 1.0)]),
                Err(TransportError::Request("connection reset".into())),
                Ok(vec![]),
                Ok(vec![fix(5, 2.0), fix(20, 3.0)]),
            ],
            stop,
        );
        let mut controller = controller();

        live.run(&transport, &mut controller).await;

        assert_eq!(transport.requests(), vec![true, false, false, false, false]);
        let stored = controller.positions().find_by_device(1).unwrap();
        assert_eq!(stored.fix_time.timestamp(), 20);
        assert_eq!(stored.longitude, 3.0);
        assert_eq!(controller.surface().len(), 1);

        let snapshot = controller.metrics().snapshot();
        assert_eq!(snapshot.batches, 3);
        assert_eq!(snapshot.transport_failures, 1);
        assert_eq!(snapshot.stale, 1);
    }

    #[tokio::test]
    async fn backoff_after_failure_is_cut_short_by_stop() {
        let (live, stop) = LiveUpdates::new(Duration::from_secs(3600));
        let transport = ScriptedTransport::new(
            vec![Err(TransportError::Status(500))],
            LiveUpdates::new(Duration::ZERO).1,
        );
        let mut controller = controller();

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stop.stop();
        };
        tokio::join!(live.run(&transport, &mut controller), stopper);

        assert_eq!(transport.requests(), vec![true]);
        assert_eq!(controller.metrics().snapshot().transport_failures, 1);
    }
}
