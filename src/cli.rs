// SPDX-License-Identifier: GPL-3.0-only

//! Headless booth commands
//!
//! - Listing available cameras
//! - Taking a photo after a countdown
//! - Generating from an image file
//! - Checking the generation server

use chrono::Local;
use photobooth::backends::camera::{CameraBackend, StreamRequest};
use photobooth::capture::{MediaCapture, TickOutcome};
use photobooth::config::{self, Config};
use photobooth::constants::timing;
use photobooth::generation::{GenerationClient, GenerationContext};
use photobooth::image_source::ImageSource;
use photobooth::presenter::qr;
use photobooth::storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

/// List all available cameras
pub fn list_cameras(backend: Arc<dyn CameraBackend>) -> Result<(), Box<dyn std::error::Error>> {
    if !backend.is_available() {
        println!("Camera capture is not available on this system.");
        return Ok(());
    }

    let cameras = backend.enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let facing = if camera.is_front_facing() { " (front)" } else { "" };
        println!("  [{}] {}{}", index, camera.name, facing);
        println!("      Path: {}", camera.path);
        if let Some(info) = &camera.device_info {
            println!("      Driver: {} {}", info.driver, info.bus_info);
        }
        println!();
    }

    Ok(())
}

/// Count down, capture one still and save it as PNG
pub fn take_photo(
    runtime: &Runtime,
    backend: Arc<dyn CameraBackend>,
    config: &Config,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = StreamRequest {
        device_path: config.camera_device.clone(),
        prefer_front: true,
    };
    let mut capture =
        MediaCapture::new(backend, request).with_countdown_seconds(config.countdown_seconds);

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let image = runtime.block_on(async {
        if let Err(e) = capture.open().await {
            return Err(e.alert_text());
        }
        if let Some(session) = capture.session() {
            println!("Using camera: {} ({})", session.device().name, session.format());
        }

        let epoch = capture.start_countdown().map_err(|e| e.to_string())?;
        println!("Smile! (press Ctrl+C to cancel)");
        print_countdown(config.countdown_seconds);

        loop {
            // Sleep in slices so Ctrl+C releases the camera promptly
            let mut waited = Duration::ZERO;
            while waited < timing::COUNTDOWN_TICK {
                if stop_flag.load(Ordering::SeqCst) {
                    capture.close();
                    return Ok(None);
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
                waited += Duration::from_millis(100);
            }

            match capture.tick(epoch).map_err(|e| e.alert_text())? {
                TickOutcome::Remaining(remaining) => print_countdown(remaining),
                TickOutcome::Captured(image) => return Ok(Some(image)),
                TickOutcome::Stale => return Err("countdown interrupted".to_string()),
            }
        }
    })?;
    println!();

    let Some(image) = image else {
        println!("Cancelled, camera released.");
        return Ok(());
    };

    let filename = format!("IMG_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
    let (output_dir, filename) = resolve_output(output, config, filename);
    let path = runtime.block_on(storage::save_download(&image.image, &output_dir, &filename))?;

    let (width, height) = image.image.dimensions();
    println!("Photo saved: {} ({}x{})", path.display(), width, height);
    Ok(())
}

fn print_countdown(remaining: u32) {
    print!("\r  {} ", remaining);
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

/// Send `input` to the generation server and save the result (and QR code)
pub fn generate(
    runtime: &Runtime,
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = GenerationClient::from_config(config)?;
    let context = GenerationContext::from_config(config);

    runtime.block_on(async {
        let mut source = ImageSource::new();
        source.from_upload(input).await?;
        let Some(image) = source.active() else {
            return Err("An image is required".into());
        };

        println!("Server: {}", client.server());
        println!("Prompt: {}", client.render_prompt(&context));
        println!("Generating...");
        let result = client.generate(image, &context).await?;

        let filename =
            storage::download_filename(&config.filename_prefix, &context.display_name, Local::now());
        let (output_dir, filename) = resolve_output(output, config, filename);
        let path = storage::save_download(&result.image, &output_dir, &filename).await?;
        println!("Image saved: {}", path.display());

        if let Some(qr_image) = &result.qr_code {
            let qr_name = filename.replace(".png", "_qr.png");
            let qr_path = storage::save_download(qr_image, &output_dir, &qr_name).await?;
            println!("QR code saved: {}", qr_path.display());
            if let Some(payload) = qr::decode_payload(qr_image) {
                println!("QR link: {}", payload);
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Report whether the generation server has its API key
pub fn check_health(runtime: &Runtime, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = GenerationClient::from_config(config)?;
    let status = runtime.block_on(client.check_health())?;
    println!("Server: {}", client.server());
    if status.has_api_key {
        println!("API key: configured");
    } else {
        println!("API key: missing");
    }
    Ok(())
}

/// Split `--output` into a directory and file name
///
/// A directory (or a path without extension) keeps `default_name`; a file
/// path overrides it.
/// Persist `config` to `path`, or to the default settings file
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let written = match path {
        Some(path) => {
            config::save_to_path(config, path)?;
            path.to_path_buf()
        }
        None => config::save(config)?,
    };
    println!("Settings written to {}", written.display());
    Ok(())
}

fn resolve_output(output: Option<PathBuf>, config: &Config, default_name: String) -> (PathBuf, String) {
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => (path, default_name),
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(default_name);
            (dir, name)
        }
        None => (config.download_directory(), default_name),
    }
}
