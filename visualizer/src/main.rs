use anyhow::anyhow;
use clap::Parser;
use config::ClientConfig;
use iced::{
    time,
    widget::{button, column, row, scrollable, text, Canvas, Column, Container},
    Alignment, Element, Length, Subscription, Task, Theme,
};
use map_canvas::MapCanvas;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use trackcore::map::{VectorLayer, WebMercator};
use trackcore::model::{DeviceId, DeviceRecord, PositionId, PositionRecord};
use trackcore::tracking::{PollOutcome, SelectionState};
use trackcore::{
    LiveStop, LiveUpdates, MapController, MapEvent, OverlayKey, PositionTransport, Projection,
    TransportError,
};
use transport::HttpTransport;

mod config;
mod headless;
mod map_canvas;
mod transport;

const MIN_RESOLUTION: f64 = 0.5;
const MAX_RESOLUTION: f64 = 5_000.0;

#[derive(Parser)]
#[command(author, version, about = "Live fleet tracking map")]
struct Args {
    /// Client configuration in YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base URL, overrides the config file
    #[arg(long)]
    server: Option<String>,
    /// Follow the feed without opening a window
    #[arg(long, default_value_t = false)]
    headless: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.server = server;
    }
    let transport = HttpTransport::new(&config.server, config.request_timeout())?;

    if args.headless {
        return headless::run(config, transport);
    }

    iced::application(
        move || TrackMap::boot(config.clone(), transport.clone()),
        TrackMap::update,
        TrackMap::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()
    .map_err(|err| anyhow!("map window failed: {err}"))
}

fn application_title(state: &TrackMap) -> String {
    format!("Fleet map - {}", state.config.server)
}

fn application_subscription(state: &TrackMap) -> Subscription<Message> {
    if state.controller.surface().is_animating(Instant::now()) {
        time::every(Duration::from_millis(33)).map(|_| Message::Frame)
    } else {
        Subscription::none()
    }
}

fn application_theme(_: &TrackMap) -> Theme {
    Theme::Light
}

struct TrackMap {
    config: ClientConfig,
    transport: HttpTransport,
    controller: MapController<VectorLayer, WebMercator>,
    live: Option<LiveUpdates>,
    stop: Option<LiveStop>,
    // Bumped on every resume so responses of a paused session are dropped.
    generation: u64,
    resolution: f64,
    route: Vec<PositionRecord>,
    status: String,
}

#[derive(Debug, Clone)]
enum Message {
    Frame,
    DevicesFetched(Result<Vec<DeviceRecord>, TransportError>),
    BatchFetched(u64, Result<Vec<PositionRecord>, TransportError>),
    PollAgain(u64),
    SelectDevice(DeviceId),
    ShowRoute(DeviceId),
    RouteFetched(DeviceId, Result<Vec<PositionRecord>, TransportError>),
    SelectReportPoint(PositionId),
    ClearRoute,
    ZoomIn,
    ZoomOut,
    ToggleLive,
}

impl TrackMap {
    fn boot(config: ClientConfig, transport: HttpTransport) -> (Self, Task<Message>) {
        let center = WebMercator.project(config.center_longitude, config.center_latitude);
        let controller = MapController::new(
            VectorLayer::new(center),
            WebMercator,
            config.style.clone(),
            Default::default(),
        );
        let fetch = fetch_devices(transport.clone());

        (
            TrackMap {
                resolution: config.resolution,
                config,
                transport,
                controller,
                live: None,
                stop: None,
                generation: 0,
                route: Vec::new(),
                status: "Fetching devices...".into(),
            },
            fetch,
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Frame => Task::none(),
            Message::DevicesFetched(Ok(devices)) => {
                state.status = format!("{} devices", devices.len());
                state.controller.set_devices(devices);
                state.start_live()
            }
            Message::DevicesFetched(Err(err)) => {
                state.status = format!("Device list error: {err}");
                let transport = state.transport.clone();
                let backoff = state.config.failure_backoff();
                Task::perform(
                    async move {
                        tokio::time::sleep(backoff).await;
                        transport.fetch_devices().await
                    },
                    Message::DevicesFetched,
                )
            }
            Message::BatchFetched(generation, response) => {
                if generation != state.generation {
                    state.controller.metrics().record_discarded();
                    return Task::none();
                }
                let Some(live) = &state.live else {
                    return Task::none();
                };
                match live.accept(response, &mut state.controller) {
                    PollOutcome::Applied(summary) => {
                        if summary.applied > 0 {
                            state.status = format!(
                                "{} positions applied, {} stale",
                                summary.applied, summary.stale
                            );
                        }
                        state.poll()
                    }
                    PollOutcome::Failed => {
                        state.status = "Position request failed, retrying".into();
                        let backoff = state.config.failure_backoff();
                        if backoff.is_zero() {
                            state.poll()
                        } else {
                            Task::perform(tokio::time::sleep(backoff), move |_| {
                                Message::PollAgain(generation)
                            })
                        }
                    }
                    PollOutcome::Discarded => Task::none(),
                }
            }
            Message::PollAgain(generation) => {
                if generation == state.generation {
                    state.poll()
                } else {
                    Task::none()
                }
            }
            Message::SelectDevice(device_id) => {
                state.controller.handle(MapEvent::SelectDevice(device_id));
                Task::none()
            }
            Message::ShowRoute(device_id) => {
                let transport = state.transport.clone();
                Task::perform(
                    async move { transport.fetch_route(device_id).await },
                    move |result| Message::RouteFetched(device_id, result),
                )
            }
            Message::RouteFetched(device_id, Ok(records)) => {
                state.status = format!("Route of device {device_id}: {} points", records.len());
                state.controller.handle(MapEvent::ReportShow(records.clone()));
                state.route = records;
                Task::none()
            }
            Message::RouteFetched(device_id, Err(err)) => {
                state.status = format!("Route of device {device_id} failed: {err}");
                Task::none()
            }
            Message::SelectReportPoint(position_id) => {
                state.controller.handle(MapEvent::SelectReport(position_id));
                Task::none()
            }
            Message::ClearRoute => {
                state.controller.handle(MapEvent::ReportClear);
                state.route.clear();
                Task::none()
            }
            Message::ZoomIn => {
                state.resolution = (state.resolution / 2.0).max(MIN_RESOLUTION);
                Task::none()
            }
            Message::ZoomOut => {
                state.resolution = (state.resolution * 2.0).min(MAX_RESOLUTION);
                Task::none()
            }
            Message::ToggleLive => {
                if let Some(stop) = state.stop.take() {
                    stop.stop();
                    state.status = "Live updates paused".into();
                    Task::none()
                } else {
                    state.generation += 1;
                    state.start_live()
                }
            }
        }
    }

    fn start_live(&mut self) -> Task<Message> {
        if let Some(stop) = self.stop.take() {
            stop.stop();
        }
        let (live, stop) = LiveUpdates::new(self.config.failure_backoff());
        self.live = Some(live);
        self.stop = Some(stop);
        self.poll()
    }

    fn poll(&mut self) -> Task<Message> {
        let Some(first) = self.live.as_mut().and_then(LiveUpdates::next_request) else {
            return Task::none();
        };
        let transport = self.transport.clone();
        let generation = self.generation;
        Task::perform(
            async move { transport.fetch_updates(first).await },
            move |response| Message::BatchFetched(generation, response),
        )
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let selected = match state.controller.selection() {
            SelectionState::Selected(OverlayKey::Live(id)) => Some(id),
            _ => None,
        };

        let devices = state.controller.devices().sorted().into_iter().fold(
            Column::new().spacing(4),
            |col, device| {
                let marker = if selected == Some(device.id) { "> " } else { "" };
                let label = if state.controller.markers().contains(device.id) {
                    format!("{marker}{}", device.name)
                } else {
                    format!("{marker}{} (no fix)", device.name)
                };
                col.push(
                    row![
                        text(label).size(14).width(Length::Fill),
                        button(text("Select").size(12)).on_press(Message::SelectDevice(device.id)),
                        button(text("Route").size(12)).on_press(Message::ShowRoute(device.id)),
                    ]
                    .spacing(6)
                    .align_y(Alignment::Center),
                )
            },
        );

        let report_points = if state.route.is_empty() {
            Column::new().push(text("No route shown").size(12))
        } else {
            state.route.iter().fold(Column::new().spacing(2), |col, record| {
                col.push(
                    button(
                        text(format!("#{} {}", record.id, record.fix_time.format("%H:%M:%S")))
                            .size(12),
                    )
                    .on_press(Message::SelectReportPoint(record.id)),
                )
            })
        };

        let metrics = state.controller.metrics().snapshot();
        let live_label = if state.stop.is_some() { "Pause" } else { "Resume" };

        let panel = column![
            text("Devices").size(24),
            scrollable(devices).height(Length::FillPortion(2)),
            row![
                button("Zoom in").on_press(Message::ZoomIn),
                button("Zoom out").on_press(Message::ZoomOut),
                button(live_label).on_press(Message::ToggleLive),
            ]
            .spacing(6),
            text("Route").size(20),
            scrollable(report_points).height(Length::FillPortion(1)),
            button("Clear route").on_press(Message::ClearRoute),
            text(&state.status).size(14),
            text(format!(
                "batches {} | applied {} | stale {} | failures {}",
                metrics.batches,
                metrics.inserted + metrics.replaced,
                metrics.stale,
                metrics.transport_failures
            ))
            .size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(340.0));

        let map = Canvas::new(MapCanvas::new(
            state.controller.surface(),
            Instant::now(),
            state.resolution,
        ))
        .width(Length::Fill)
        .height(Length::Fill);

        Container::new(row![panel, map].spacing(0))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn fetch_devices(transport: HttpTransport) -> Task<Message> {
    Task::perform(
        async move { transport.fetch_devices().await },
        Message::DevicesFetched,
    )
}
