// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use photobooth::app::Booth;
use photobooth::backends::camera::{self, CameraBackend};
use photobooth::backends::virtual_camera::VirtualCameraBackend;
use photobooth::config::{self, Config};
use photobooth::constants::app_info;
use photobooth::presenter::{Celebration, TerminalConfetti};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Graduation photo booth: capture, generate, scan to download")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings that can be overridden per run
#[derive(Args)]
struct Overrides {
    /// Settings file (default: ~/.config/photobooth/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Generation server base URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Graduate display name
    #[arg(long, global = true)]
    name: Option<String>,

    /// Program/track name used in the prompt
    #[arg(long, global = true)]
    track: Option<String>,

    /// Camera device path (e.g. /dev/video2)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Serve this image as the camera instead of a real device
    #[arg(long, global = true, value_name = "IMAGE")]
    virtual_camera: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo after the countdown
    Photo {
        /// Output file or directory (default: ~/Pictures/Photobooth/IMG_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a graduation photo from an image file
    Generate {
        /// Source image
        input: PathBuf,

        /// Output file or directory (default: ~/Pictures/Photobooth)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the generation server configuration
    Health,

    /// Write the effective settings (file plus flags) back to the settings file
    SaveConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    init_logging(terminal_mode)?;

    let config = load_config(&cli.overrides)?;
    let backend: Arc<dyn CameraBackend> = match &cli.overrides.virtual_camera {
        Some(path) => Arc::new(VirtualCameraBackend::new(path)),
        None => camera::get_backend(),
    };
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        None | Some(Commands::Terminal) => run_terminal(&runtime, config, backend),
        Some(Commands::List) => cli::list_cameras(backend),
        Some(Commands::Photo { output }) => cli::take_photo(&runtime, backend, &config, output),
        Some(Commands::Generate { input, output }) => {
            cli::generate(&runtime, &config, &input, output)
        }
        Some(Commands::Health) => cli::check_health(&runtime, &config),
        Some(Commands::SaveConfig) => {
            cli::save_config(&config, cli.overrides.config.as_deref())
        }
    }
}

fn init_logging(terminal_mode: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if terminal_mode {
        // The alternate screen owns stdout/stderr; log to a file instead
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(app_info::APP_DIR);
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("photobooth.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
    }
    Ok(())
}

fn load_config(overrides: &Overrides) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &overrides.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    if let Some(server) = &overrides.server {
        config.server_url = server.clone();
    }
    if let Some(name) = &overrides.name {
        config.display_name = Some(name.clone());
    }
    if let Some(track) = &overrides.track {
        config.track = Some(track.clone());
    }
    if let Some(device) = &overrides.device {
        config.camera_device = Some(device.clone());
    }
    Ok(config)
}

fn run_terminal(
    runtime: &tokio::runtime::Runtime,
    config: Config,
    backend: Arc<dyn CameraBackend>,
) -> Result<(), Box<dyn std::error::Error>> {
    let confetti = TerminalConfetti::new();
    let celebration: Arc<dyn Celebration> = Arc::new(confetti.clone());
    let booth = Booth::new(config, backend, Some(celebration))?;
    photobooth::terminal::run(booth, confetti, runtime.handle())
}
