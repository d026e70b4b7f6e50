use crate::config::ClientConfig;
use crate::transport::HttpTransport;
use anyhow::Context;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use trackcore::map::{VectorLayer, WebMercator};
use trackcore::telemetry::LogManager;
use trackcore::{LiveUpdates, MapController, Projection};

/// Follows the live feed without a window until Ctrl+C, then logs the feed counters.
pub fn run(config: ClientConfig, transport: HttpTransport) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating headless runtime")?;

    let logger = LogManager::new("headless");
    runtime.block_on(async move {
        let devices = transport
            .fetch_devices()
            .await
            .with_context(|| format!("fetching devices from {}", config.server))?;
        logger.record(&format!("{} devices known", devices.len()));

        let center = WebMercator.project(config.center_longitude, config.center_latitude);
        let mut controller = MapController::new(
            VectorLayer::new(center),
            WebMercator,
            config.style.clone(),
            devices.into_iter().collect(),
        );

        let (live, stop) = LiveUpdates::new(config.failure_backoff());
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                stop.stop();
            }
        });

        live.run(&transport, &mut controller).await;

        let snapshot = controller.metrics().snapshot();
        logger.record(&format!(
            "batches={} inserted={} replaced={} stale={} markers={} unknown={} failures={}",
            snapshot.batches,
            snapshot.inserted,
            snapshot.replaced,
            snapshot.stale,
            snapshot.markers_created,
            snapshot.unknown_devices,
            snapshot.transport_failures
        ));
        Ok::<(), anyhow::Error>(())
    })
}
