//! Composition root: loads configuration, wires the controller registry,
//! ring topology, and the three core loops together, and runs until
//! interrupted. Grounded on the teacher's `gui_main.rs` startup
//! sequencing (parse args, build the runtime's shared state, run until
//! shutdown), stripped of everything GUI-specific.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use camera_controller::{CameraController, ControllerRegistry};
use capture_core::CaptureCore;
use cli::{CameraKind, Cli, Command, RunArgs};
use control_core::ControlCore;
use daq_core::config::EngineConfig;
use frame_ring::{FrameRings, RingRegistry};
use liveview_core::LiveviewCore;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn load_config(args: &RunArgs) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::load(args.config.as_deref())?;
    if let Some(camera) = args.camera {
        config.camera.simulated_camera = camera == CameraKind::Simulated;
    }
    if let Some(endpoint) = &args.control_endpoint {
        config.control.endpoint = endpoint.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::CheckConfig(args) => {
            let config = load_config(&args)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    tracing::info!(?config, "starting camera-daqd");

    let controller_registry = ControllerRegistry::new();
    let socket_id = config.capture.socket_id;
    let controller = controller_registry.get_or_insert_with(socket_id, || {
        Arc::new(CameraController::new(config.camera.clone()))
    });

    let ring_registry = RingRegistry::new();
    let rings = FrameRings::new(
        &ring_registry,
        "capture",
        socket_id,
        config.capture.pool_size,
        camera_protocol::decoder::frame_buffer_size(),
        config.capture.num_downstream_cores,
    );

    let capture_core = Arc::new(CaptureCore::new(controller.clone(), rings));
    let capture_thread = {
        let capture_core = capture_core.clone();
        std::thread::spawn(move || {
            if let Err(err) = capture_core.run() {
                tracing::error!(error = %err, "capture core exited with an error");
            }
        })
    };

    let liveview_core = if config.liveview.enabled {
        let pool = capture_core.rings().shared_pool();
        let clear = capture_core.rings().clear.clone();
        let Some(source) = capture_core
            .rings()
            .downstream
            .get(config.liveview.downstream_index)
            .cloned()
        else {
            anyhow::bail!(
                "liveview.downstream_index {} has no matching downstream ring (num_downstream_cores = {})",
                config.liveview.downstream_index,
                config.capture.num_downstream_cores
            );
        };
        let core = Arc::new(LiveviewCore::with_session_capacity(
            pool,
            clear,
            source,
            config.liveview.session_capacity,
        ));
        let thread = {
            let core = core.clone();
            std::thread::spawn(move || {
                if let Err(err) = core.run() {
                    tracing::error!(error = %err, "liveview core exited with an error");
                }
            })
        };
        Some((core, thread))
    } else {
        None
    };

    let control_core = Arc::new(ControlCore::new(controller.clone()));
    let control_task = {
        let control_core = control_core.clone();
        let endpoint = config.control.endpoint.clone();
        let poll_interval = Duration::from_millis(config.control.poll_interval_ms);
        tokio::spawn(async move {
            if let Err(err) = control_core.run(&endpoint, poll_interval).await {
                tracing::error!(error = %err, "control core exited with an error");
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping cores");

    capture_core.stop();
    control_core.stop();
    if let Some((core, _)) = &liveview_core {
        core.stop();
    }

    let _ = capture_thread.join();
    if let Some((_, thread)) = liveview_core {
        let _ = thread.join();
    }
    control_task.abort();

    Ok(())
}
