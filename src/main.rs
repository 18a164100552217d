//! Camera Capture CLI
//!
//! Drives a capture controller through a script of commands and prints
//! each reported event as a JSON line. Uses the synthetic camera host.

use camera_capture::{
    analysis::StaticFaceDetector,
    capture::mock::{MockDevices, MockElement},
    metrics::MetricsRegistry,
    render::FileDisplay,
    transport::LocalTransport,
    CaptureController, CaptureHost, Command, FaceRegion, FileConfig,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "camera-capture", version, about = "Camera capture controller demo")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file holding an array of commands to run.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Directory for uploaded frames and the preview image.
    #[arg(short, long, default_value = "capture-out")]
    output_dir: PathBuf,

    /// Preview scale factor (overrides the configuration).
    #[arg(short, long)]
    ratio: Option<f64>,

    /// Serve live metrics while the script runs and until Ctrl-C.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    serve: bool,
}

fn default_script(ratio: f64) -> Vec<Command> {
    vec![
        Command::ShowInstruction {
            text: "Look at the camera".to_string(),
        },
        Command::Enable,
        Command::GrabFrame,
        Command::DetectFaces,
        Command::ScanQrCode,
        Command::ShowImage { ratio },
        Command::GrabFrameAndTransmitBack,
        Command::StreamState,
        Command::Disable,
    ]
}

fn load_script(path: &PathBuf) -> Result<Vec<Command>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Camera Capture v{}", camera_capture::VERSION);
    info!("This is a demonstration using a synthetic camera");

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(ratio) = args.ratio {
        config.render.preview_ratio = ratio;
    }

    let script = match &args.script {
        Some(path) => match load_script(path) {
            Ok(script) => script,
            Err(e) => {
                eprintln!("Failed to load script: {}", e);
                std::process::exit(1);
            }
        },
        None => default_script(config.render.preview_ratio),
    };

    if let Err(e) = std::fs::create_dir_all(&args.output_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    // The synthetic camera reports a face in the middle of the frame.
    let (width, height) = (config.capture.width as f64, config.capture.height as f64);
    let face = FaceRegion::new(width * 0.3, height * 0.2, width * 0.4, height * 0.6);

    let host = CaptureHost {
        devices: Box::new(MockDevices::new()),
        element: Box::new(MockElement::new()),
        transport: Arc::new(LocalTransport::new(args.output_dir.join("uploads"))),
        display: Box::new(FileDisplay::new(args.output_dir.join("preview.jpg"))),
    };
    let mut controller = match CaptureController::new(&config, host) {
        Ok(controller) => {
            controller.with_face_detector(Box::new(StaticFaceDetector::new(vec![face])))
        }
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "metrics")]
    let exporter = if args.serve && config.output.metrics_port != 0 {
        use camera_capture::metrics::{MetricsServer, MetricsServerConfig};

        let server = MetricsServer::new(
            MetricsServerConfig::with_port(config.output.metrics_port),
            new_registry(),
        );
        let state = server.state();
        let task = tokio::spawn(server.run_until(shutdown_signal()));
        Some((state, task))
    } else {
        None
    };

    for command in &script {
        if let Err(e) = controller.dispatch(command.name(), command).await {
            warn!("Failed to report {}: {}", command.name(), e);
        }

        #[cfg(feature = "metrics")]
        if let Some((state, _)) = &exporter {
            state.write().await.update(controller.stats());
        }
    }

    let stats = controller.stats();
    info!(
        frames = stats.frames_grabbed,
        uploads = stats.uploads,
        restarts = stats.stall_restarts,
        "Script finished"
    );

    #[cfg(feature = "metrics")]
    if let Some((_, task)) = exporter {
        info!(
            port = config.output.metrics_port,
            "Serving metrics until interrupted"
        );
        match task.await {
            Ok(Ok(())) => info!("Shutting down"),
            Ok(Err(e)) => {
                eprintln!("Metrics server failed: {}", e);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Metrics server task failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let registry = new_registry();
    registry.update(&stats);
    match registry.encode() {
        Ok(output) => eprint!("{}", output),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
}

fn new_registry() -> MetricsRegistry {
    match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "metrics")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
}
