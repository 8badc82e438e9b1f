//! Face Analysis Client CLI
//!
//! Terminal front end for the face-analysis service: one-shot health
//! checks and analyses, plus an interactive capture screen.

use clap::{Parser, Subcommand};
use face_analysis_client::{
    capture::{open_camera, CameraSource, CaptureController, PermissionPolicy, StaticPermission},
    client::{AnalysisClient, AnalysisService},
    config::FileConfig,
    metrics::MetricsRegistry,
    view::{Notice, Operation, Surface, TerminalSurface, ViewController, ViewEvent, ViewState},
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "face-analysis-client", version, about = "Client for a remote face-analysis service")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Service base URL, overrides the configuration file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the service is up and its models are loaded
    Health,
    /// Send one image file for analysis
    Analyze {
        #[arg(long)]
        image: PathBuf,
        /// Where to write the processed image
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Interactive capture screen
    Run {
        /// Where to write the displayed image
        #[arg(long)]
        output: Option<PathBuf>,
        /// mock, device or file:<path>
        #[arg(long)]
        camera: Option<CameraSource>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = runtime.block_on(async move {
        match cli.command {
            Command::Health => health(&config).await,
            Command::Analyze { image, output } => analyze(config, image, output).await,
            Command::Run { output, camera } => interactive(config, output, camera).await,
        }
    });

    if let Err(e) = outcome {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> CliResult<FileConfig> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_client(config: &FileConfig) -> CliResult<Arc<AnalysisClient>> {
    let client = AnalysisClient::with_policies(
        &config.service.base_url,
        config.health_policy(),
        config.analyze_policy(),
    )?;
    Ok(Arc::new(client))
}

fn build_view<S: Surface>(
    config: &FileConfig,
    surface: S,
    metrics: Arc<MetricsRegistry>,
) -> CliResult<ViewController<S>> {
    let camera = open_camera(&config.capture)?;
    let capture = CaptureController::new(
        Box::new(StaticPermission::new(config.capture.permission)),
        camera,
    );
    let view = ViewController::new(
        surface,
        capture,
        build_client(config)?,
        config.capture.jpeg_quality,
    )
    .with_metrics(metrics);
    Ok(view)
}

async fn health(config: &FileConfig) -> CliResult<()> {
    let client = build_client(config)?;
    info!(url = %client.base_url(), "Checking service health");

    match client.check_health().await {
        Ok(response) if response.models_loaded => {
            println!("Service OK: {} ({})", response.status, response.message);
            Ok(())
        }
        Ok(_) => Err(Notice::ModelsNotLoaded.message().into()),
        Err(e) => {
            let notice = Notice::for_error(Operation::Health, &e, client.base_url());
            Err(notice.message().into())
        }
    }
}

async fn analyze(
    mut config: FileConfig,
    image: PathBuf,
    output: Option<PathBuf>,
) -> CliResult<()> {
    config.capture.source = CameraSource::File { path: image };
    config.capture.permission = PermissionPolicy::Granted;

    let metrics = Arc::new(MetricsRegistry::new()?);
    let mut view = build_view(&config, TerminalSurface::new(output), metrics)?;

    view.handle(ViewEvent::Tap);
    while view.state() == ViewState::Processing {
        if !view.step().await {
            break;
        }
    }

    match view.surface().failure() {
        Some(notice) => {
            let summary = notice.message();
            let headline = summary.lines().next().unwrap_or_default();
            Err(format!("Analysis failed: {headline}").into())
        }
        None => Ok(()),
    }
}

async fn interactive(
    mut config: FileConfig,
    output: Option<PathBuf>,
    camera: Option<CameraSource>,
) -> CliResult<()> {
    if let Some(source) = camera {
        config.capture.source = source;
    }

    let metrics = Arc::new(MetricsRegistry::new()?);
    spawn_metrics_server(&config, metrics.clone());

    let view = build_view(&config, TerminalSurface::new(output), metrics)?;

    let events = view.sender();
    ctrlc::set_handler(move || {
        let _ = events.send(ViewEvent::Shutdown);
    })?;

    let events = view.sender();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = match line.trim() {
                "" => ViewEvent::Tap,
                "p" => ViewEvent::Pause,
                "r" => ViewEvent::Resume,
                "h" => ViewEvent::CheckHealth,
                "q" => ViewEvent::Shutdown,
                other => {
                    warn!(input = other, "Unknown command");
                    continue;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(ViewEvent::Shutdown);
    });

    info!(
        "Face Analysis Client v{} using {}",
        face_analysis_client::VERSION,
        config.service.base_url
    );
    println!("Press Enter to take a photo (p = pause, r = resume, h = health, q = quit)");

    view.run().await;
    info!("Goodbye");
    Ok(())
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(config: &FileConfig, metrics: Arc<MetricsRegistry>) {
    use face_analysis_client::metrics::{MetricsServer, MetricsServerConfig};

    if config.metrics.port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(config.metrics.port), metrics);
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            warn!(error = %e, "Metrics server stopped");
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(_config: &FileConfig, _metrics: Arc<MetricsRegistry>) {}
