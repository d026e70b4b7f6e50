use anyhow::Context;
use api::bridge::ApiBridge;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use trackcore::model::Envelope;
use workflow::config::SimulationConfig;
use workflow::runner::Runner;

mod api;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic fleet backend for the tracking map")]
struct Args {
    /// Print one snapshot and one step as JSON, then exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a simulation config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 5)]
    devices: usize,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    #[arg(long, default_value_t = 8082)]
    port: u16,
    /// Serve the HTTP API until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.workflow {
        SimulationConfig::load(path)?
    } else {
        SimulationConfig::from_args(args.devices, args.seed, args.port)
    };

    let mut runner = Runner::new(config.clone())?;

    if args.offline {
        let snapshot = runner.poll(true);
        let step = runner.poll(false);

        println!(
            "{}",
            serde_json::to_string_pretty(&Envelope::new(snapshot.clone()))
                .context("encoding snapshot")?
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&Envelope::new(step.clone())).context("encoding step")?
        );

        let report = format!(
            "devices={} snapshot={} step={} seed={}\n",
            config.devices,
            snapshot.len(),
            step.len(),
            config.seed
        );
        let report_path = PathBuf::from("tools/data/offline_positions.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }

    if args.serve {
        let bridge = ApiBridge::start(Arc::new(Mutex::new(runner)), config.port);
        bridge.publish_status(&format!(
            "serving {} devices on {} (Ctrl+C to stop)...",
            config.devices,
            bridge.addr()
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
