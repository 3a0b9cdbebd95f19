//! sensehat-voice: Alexa skill webhook for a Raspberry Pi with a Sense HAT
//!
//! Answers launch, environment, temperature, humidity and pressure intents
//! with spoken text and a card, and mirrors the numbers on the LED matrix.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === Modules ===

mod actuators;
mod config;
mod error;
mod sensors;
mod server;
mod shared;
mod skill;

use actuators::display::{DisplayQueue, TextSink};
use actuators::led_matrix::{DEV_ROOT, GRAPHICS_ROOT};
use config::{BoardKind, Config, CpuSensor};
use sensors::iio::IIO_ROOT;
use sensors::sense_hat::SenseHat;
use sensors::simulated::SimulatedBoard;
use sensors::{CpuThermometer, SenseBoard, SensorReader};
use shared::{format_tenths, round_tenths, truncate_percent};
use skill::dispatcher::Dispatcher;

// === CLI ===

#[derive(Parser)]
#[command(name = "sensehat-voice")]
#[command(about = "Alexa skill webhook for Raspberry Pi Sense HAT readings")]
struct Cli {
    /// Config file (default: ~/.config/sensehat-voice/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Use the simulated board instead of the Sense HAT
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in your editor
    Config,
    /// Print one calibrated reading and exit
    Read,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => {
            run_config_command(cli.config.as_deref())?;
        }
        Some(Commands::Read) => {
            let config = load_config(&cli)?;
            init_tracing(&config);
            run_read_command(&config)?;
        }
        None => {
            let config = load_config(&cli)?;
            init_tracing(&config);
            run_server(config).await?;
        }
    }

    Ok(())
}

/// Config file and environment, then CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.simulate {
        config.board = BoardKind::Simulated;
    }

    Ok(config)
}

fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Seed the config file from the bundled example, then hand it to $EDITOR
fn run_config_command(explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::path().context("No config directory on this system")?,
    };

    if seed_config_file(&path)? {
        println!("Wrote default settings to {}", path.display());
    }

    let editor = ["EDITOR", "VISUAL"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| "nano".to_string());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to start {} on {}", editor, path.display()))?;

    Ok(())
}

/// Write config.toml.example to `path` unless something is already there
fn seed_config_file(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, include_str!("../config.toml.example"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Build the board and CPU thermometer the config asks for
fn open_board(config: &Config) -> anyhow::Result<(Arc<dyn SenseBoard>, Arc<dyn CpuThermometer>)> {
    match config.board {
        BoardKind::SenseHat => {
            let board = SenseHat::discover(
                Path::new(IIO_ROOT),
                Path::new(GRAPHICS_ROOT),
                Path::new(DEV_ROOT),
                Duration::from_millis(config.scroll_ms),
            )
            .context("Sense HAT not found (run with --simulate to use fake readings)")?;
            let board: Arc<dyn SenseBoard> = Arc::new(board);
            Ok((board, cpu_thermometer(config.cpu_sensor)?))
        }
        BoardKind::Simulated => {
            tracing::info!("Using simulated board");
            let board = SimulatedBoard::new(config.simulated);
            let cpu: Arc<dyn CpuThermometer> = Arc::new(board.thermometer());
            let board: Arc<dyn SenseBoard> = Arc::new(board);
            Ok((board, cpu))
        }
    }
}

fn cpu_thermometer(source: CpuSensor) -> anyhow::Result<Arc<dyn CpuThermometer>> {
    match source {
        CpuSensor::Vcgencmd => Ok(Arc::new(sensors::cpu::Vcgencmd::default())),
        #[cfg(feature = "cpu-fallback")]
        CpuSensor::Sysinfo => Ok(Arc::new(sensors::cpu::SysinfoThermometer)),
        #[cfg(not(feature = "cpu-fallback"))]
        CpuSensor::Sysinfo => anyhow::bail!("cpu_sensor = \"sysinfo\" needs the cpu-fallback feature"),
    }
}

/// Print one reading, rounded the way it is spoken
fn run_read_command(config: &Config) -> anyhow::Result<()> {
    let (board, cpu) = open_board(config)?;
    let reading = SensorReader::new(board, cpu)
        .read_environment()
        .context("Failed to read sensors")?;

    println!("Temperature: {}°C", format_tenths(round_tenths(reading.temperature)));
    println!("Humidity: {}%", truncate_percent(reading.humidity));
    println!("Pressure: {} hPa", format_tenths(round_tenths(reading.pressure)));
    Ok(())
}

/// Run the webhook server
async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting sensehat-voice");

    let (board, cpu) = open_board(&config)?;

    actuators::display::prepare(board.as_ref(), config.rotation);

    let display: Option<Arc<dyn TextSink>> = if config.display {
        let (queue, _worker) = DisplayQueue::spawn(Arc::clone(&board), config.display_queue);
        let sink: Arc<dyn TextSink> = Arc::new(queue);
        Some(sink)
    } else {
        None
    };
    tracing::info!(
        "Display {}, rotation {}°",
        if config.display { "enabled" } else { "disabled" },
        config.rotation.degrees()
    );

    let dispatcher = Dispatcher::new(
        SensorReader::new(board, cpu),
        config.templates.clone(),
        display,
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, server::routes(Arc::new(dispatcher)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("sensehat-voice stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
