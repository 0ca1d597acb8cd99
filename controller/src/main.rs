//! Beamguard Controller - entry point.
//!
//! Wires the hardware backend, the evidence store, the event log and the
//! in-process evidence publisher together, then runs the detection loop
//! until a termination signal arrives.
//!
//! # Usage
//!
//! ```bash
//! # Against real hardware (requires the `hardware` build feature)
//! beamguard-controller
//!
//! # Against simulated hardware
//! beamguard-controller --demo
//! ```
//!
//! # Environment Variables
//!
//! See the [`beamguard_controller::config`] module for available
//! configuration options. CLI flags override the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use beamguard_controller::alarm::AlarmStateMachine;
use beamguard_controller::config::Config;
use beamguard_controller::controller::Controller;
use beamguard_controller::evidence::EvidenceStore;
use beamguard_controller::event_log::EventLogger;
use beamguard_controller::hal::sim::{SimCamera, SimInput, SimOutput};
use beamguard_controller::hal::{Buzzer, CameraDevice, DigitalInput, DigitalOutput};
use beamguard_controller::recording::RecordingStateMachine;
use beamguard_controller::sensors::{DebounceFilter, SensorSampler};
use beamguard_server::EvidencePublisher;

/// Graceful shutdown timeout for the publisher join.
const SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Demo mode: beam-break pattern, in samples (break, then clear).
const DEMO_BREAK_SAMPLES: usize = 15;
const DEMO_CLEAR_SAMPLES: usize = 185;

/// Demo mode: motion pattern, in samples (quiet, then motion).
const DEMO_QUIET_SAMPLES: usize = 160;
const DEMO_MOTION_SAMPLES: usize = 40;

/// Beamguard Controller - perimeter detection loop.
///
/// Samples a beam-break detector and a PIR motion detector, drives a
/// buzzer and a camera, and serves the captured evidence read-only over
/// HTTP.
#[derive(Parser, Debug)]
#[command(name = "beamguard-controller")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Evidence directory root (overrides BEAMGUARD_EVIDENCE_DIR).
    #[arg(long)]
    evidence_dir: Option<PathBuf>,

    /// Evidence publisher port (overrides BEAMGUARD_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Run against simulated hardware instead of GPIO and camera.
    #[arg(long)]
    demo: bool,
}

/// Boxed hardware collaborators handed to the detection loop.
struct Hardware {
    laser: Box<dyn DigitalInput>,
    pir: Box<dyn DigitalInput>,
    emitter: Option<Box<dyn DigitalOutput>>,
    buzzer: Box<dyn DigitalOutput>,
    camera: Box<dyn CameraDevice>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    init_logging();

    info!("Starting Beamguard controller");

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(evidence_dir) = args.evidence_dir {
        config.evidence_dir = evidence_dir;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!(
        evidence_dir = %config.evidence_dir.display(),
        port = config.port,
        demo = args.demo,
        "Configuration loaded"
    );

    let store = EvidenceStore::init(&config.evidence_dir)
        .context("Failed to prepare evidence directory")?;
    let logger =
        EventLogger::open(&store.log_path()).context("Failed to open event log")?;

    // Camera open failure aborts here, before the loop starts.
    let hardware = build_hardware(&config, args.demo)?;

    // The publisher starts before the detection loop begins and serves
    // until process shutdown.
    let publisher = EvidencePublisher::bind(store.root().to_path_buf(), config.port)
        .await
        .context("Failed to start evidence publisher")?;

    let sampler = SensorSampler::new(
        hardware.laser,
        hardware.pir,
        hardware.emitter,
        // The beam-break detector is active low: a low line level counts
        // toward the hazard run.
        DebounceFilter::new(config.debounce_threshold, true),
        config.sample_settle,
    );
    let alarm = AlarmStateMachine::new(Buzzer::new(hardware.buzzer, config.buzzer_active_low));
    let recording = RecordingStateMachine::new(config.video_fps);
    let mut controller = Controller::new(
        sampler,
        alarm,
        recording,
        hardware.camera,
        store,
        logger,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    info!("Beam detection started, press Ctrl+C to stop");
    controller.run(shutdown_rx).await;

    // Release the camera handle before joining the publisher.
    drop(controller);

    if !publisher
        .stop(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS))
        .await
    {
        warn!("Evidence publisher did not stop cleanly");
    }

    info!("Beamguard stopped");
    Ok(())
}

/// Builds the hardware collaborators for the selected backend.
fn build_hardware(config: &Config, demo: bool) -> Result<Hardware> {
    if demo {
        return Ok(demo_hardware());
    }
    real_hardware(config)
}

/// Simulated backend: a periodic beam break and an occasional motion
/// burst, so evidence accumulates without any wiring.
fn demo_hardware() -> Hardware {
    Hardware {
        laser: Box::new(SimInput::cycle(DEMO_BREAK_SAMPLES, DEMO_CLEAR_SAMPLES)),
        pir: Box::new(SimInput::cycle(DEMO_QUIET_SAMPLES, DEMO_MOTION_SAMPLES)),
        emitter: None,
        buzzer: Box::new(SimOutput::new()),
        camera: Box::new(SimCamera::new()),
    }
}

#[cfg(feature = "hardware")]
fn real_hardware(config: &Config) -> Result<Hardware> {
    use beamguard_controller::hal::rpi::{GpioInput, GpioOutput, OpenCvCamera};
    use rppal::gpio::Gpio;

    // The first connected camera.
    const CAMERA_INDEX: i32 = 0;

    let gpio = Gpio::new().context("Failed to initialize GPIO")?;
    let laser = GpioInput::new(&gpio, config.laser_pin).context("Failed to claim laser pin")?;
    let pir = GpioInput::new(&gpio, config.pir_pin).context("Failed to claim PIR pin")?;
    let buzzer =
        GpioOutput::new(&gpio, config.buzzer_pin).context("Failed to claim buzzer pin")?;
    let emitter = match config.emitter_pin {
        Some(pin) => {
            Some(GpioOutput::new(&gpio, pin).context("Failed to claim emitter pin")?)
        }
        None => None,
    };
    let camera = OpenCvCamera::open(CAMERA_INDEX).context("Failed to open camera")?;

    Ok(Hardware {
        laser: Box::new(laser),
        pir: Box::new(pir),
        emitter: emitter.map(|e| Box::new(e) as Box<dyn DigitalOutput>),
        buzzer: Box::new(buzzer),
        camera: Box::new(camera),
    })
}

#[cfg(not(feature = "hardware"))]
fn real_hardware(_config: &Config) -> Result<Hardware> {
    anyhow::bail!(
        "built without the `hardware` feature; rebuild with --features hardware or run with --demo"
    )
}

/// Initializes the logging subsystem.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
