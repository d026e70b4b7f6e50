use crate::api::model::{AsyncQuery, RouteQuery};
use crate::workflow::runner::Runner;
use log::{error, info};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};
use tokio::runtime::Builder;
use trackcore::model::Envelope;
use warp::{Filter, Rejection, Reply};

pub type SharedRunner = Arc<Mutex<Runner>>;

#[derive(Debug)]
struct RunnerPoisoned;

impl warp::reject::Reject for RunnerPoisoned {}

fn lock(runner: &SharedRunner) -> Result<std::sync::MutexGuard<'_, Runner>, Rejection> {
    runner.lock().map_err(|_| {
        error!("runner lock poisoned");
        warp::reject::custom(RunnerPoisoned)
    })
}

async fn poll_positions(
    query: AsyncQuery,
    runner: SharedRunner,
    step_interval: Duration,
) -> Result<impl Reply, Rejection> {
    if !query.first {
        tokio::time::sleep(step_interval).await;
    }
    let batch = lock(&runner)?.poll(query.first);
    Ok(warp::reply::json(&Envelope::new(batch)))
}

async fn list_devices(runner: SharedRunner) -> Result<impl Reply, Rejection> {
    let devices = lock(&runner)?.devices();
    Ok(warp::reply::json(&Envelope::new(devices)))
}

async fn device_route(query: RouteQuery, runner: SharedRunner) -> Result<impl Reply, Rejection> {
    let route = lock(&runner)?.route(query.device_id);
    Ok(warp::reply::json(&Envelope::new(route)))
}

/// `/api/async`, `/api/devices` and `/api/reports/route`.
///
/// Non-first polls wait `step_interval` before advancing the fleet, so a
/// client polling back-to-back receives one step per interval.
pub fn routes(
    runner: SharedRunner,
    step_interval: Duration,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let runner_filter = warp::any().map(move || runner.clone());

    let poll_route = warp::path!("api" / "async")
        .and(warp::get())
        .and(warp::query::<AsyncQuery>())
        .and(runner_filter.clone())
        .and(warp::any().map(move || step_interval))
        .and_then(poll_positions);

    let devices_route = warp::path!("api" / "devices")
        .and(warp::get())
        .and(runner_filter.clone())
        .and_then(list_devices);

    let report_route = warp::path!("api" / "reports" / "route")
        .and(warp::get())
        .and(warp::query::<RouteQuery>())
        .and(runner_filter)
        .and_then(device_route);

    poll_route.or(devices_route).or(report_route)
}

/// HTTP backend running on its own thread and runtime.
pub struct ApiBridge {
    addr: SocketAddr,
}

impl ApiBridge {
    pub fn start(runner: SharedRunner, port: u16) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let step_interval = match runner.lock() {
            Ok(guard) => guard.config().step_interval(),
            Err(_) => Duration::from_secs(1),
        };
        let api = routes(runner, step_interval);

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build API runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(api).run(addr).await;
            });
        });

        info!("fleet API listening on http://{}", addr);
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn publish_status(&self, message: &str) {
        info!("[API] {}", message);
    }
}
