//! posestage - avatar stage with a hands-up marker
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use posestage::{
    config::Config,
    scene::{
        AssetPaths, DisplayMode, HeadlessOutfit, HeadlessScene, HeadlessSurface, SceneBinding,
        StageOptions,
    },
    tracking::{PoseReceiver, TrackerProcess},
    PoseResult,
};

/// posestage - avatar scene driven by a pose tracker
#[derive(Parser, Debug)]
#[command(name = "posestage", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Avatar model path (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Display mode: fit or crop (overrides config)
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// Mirror the output horizontally
    #[arg(long)]
    mirror: bool,

    /// Pose receiver UDP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Run without the pose receiver
    #[arg(long)]
    no_tracking: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", posestage::NAME, posestage::VERSION);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(&args))?;

    info!("posestage stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.assets.model = model.clone();
    }
    if let Some(mode) = args.mode {
        config.display.mode = mode;
    }
    if args.mirror {
        config.display.mirror = true;
    }
    if let Some(port) = args.port {
        config.tracking.port = port;
    }
    if args.no_tracking {
        config.tracking.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;

    info!("Display: {} (mirror: {})", config.display.mode, config.display.mirror);
    info!(
        "Gesture thresholds: on > {}, off < {}",
        config.gesture.on_threshold, config.gesture.off_threshold
    );
    info!("Pose tracking: {}", config.tracking.enabled);

    AssetPaths::new(&config.assets).check();

    let mut binding = SceneBinding::new(
        HeadlessScene::new(),
        HeadlessOutfit::new(),
        StageOptions::from_config(&config),
    );
    binding.setup().await?;

    let mut tracker = if config.tracking.enabled && config.tracking.auto_launch {
        let mut process = TrackerProcess::new(&config.tracking);
        if let Err(e) = process.start() {
            error!("Failed to auto-launch pose tracker: {}", e);
        }
        Some(process)
    } else {
        None
    };

    let mut receiver = if config.tracking.enabled {
        let mut receiver = PoseReceiver::new(&config.tracking);
        receiver.start().await?;
        Some(receiver)
    } else {
        None
    };

    let mut surface = HeadlessSurface::new(640, 480);
    let mut interval =
        tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(config.render.fps)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Frame loop started at {} fps", config.render.fps);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            result = next_pose(&mut receiver) => {
                if let Err(e) = result {
                    warn!("Pose receive error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
            _ = interval.tick() => {
                let pose = receiver
                    .as_ref()
                    .map(|r| r.current(Instant::now()))
                    .unwrap_or_default();
                binding.update(&pose, &mut surface);

                if let Some(ref mut process) = tracker {
                    process.poll_restart(Instant::now());
                }
            }
        }
    }

    // Cleanup
    if let Some(ref mut receiver) = receiver {
        receiver.stop();
    }
    if let Some(ref mut process) = tracker {
        process.stop().await;
    }
    binding.dispose();

    info!(
        "Rendered {} frames ({} with a detected pose)",
        surface.frames_presented,
        binding.outfit_plugin().detected_frames()
    );

    Ok(())
}

/// Next pose packet, or never if tracking is disabled.
async fn next_pose(receiver: &mut Option<PoseReceiver>) -> posestage::Result<PoseResult> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
