// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Opens `/dev/video*` capture nodes directly through the `v4l` crate. Each
//! open stream owns one capture thread that converts buffers to RGBA and
//! publishes the newest one into a shared [`FrameSlot`]. Stopping the stream
//! raises the stop flag and joins the thread, which drops the mmap stream
//! (STREAMOFF) and closes the device.

use super::format_converters::{self, Packed422};
use super::types::*;
use super::{CameraBackend, CameraStream};
use crate::constants::timing;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Formats we know how to turn into RGBA, in order of preference
const PREFERRED_FOURCCS: [&[u8; 4]; 5] = [b"MJPG", b"YUYV", b"UYVY", b"RGB3", b"GREY"];

/// Undecodable frames tolerated before startup is reported as failed
const STARTUP_FRAME_BUDGET: u64 = 30;

/// Backend over the kernel's V4L2 capture devices
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for V4l2Backend {
    fn is_available(&self) -> bool {
        // Sandboxes without device access cannot even list /dev
        std::fs::read_dir("/dev").is_ok()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut paths: Vec<_> = std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("video"))
            })
            .collect();
        paths.sort();

        let mut cameras = Vec::new();
        for path in paths {
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                continue;
            }
            // UVC metadata nodes advertise capture but list no video formats
            if dev.enum_formats().map(|f| f.is_empty()).unwrap_or(true) {
                continue;
            }

            let device = CameraDevice {
                name: caps.card.clone(),
                path: path.to_string_lossy().to_string(),
                device_info: Some(DeviceInfo {
                    card: caps.card.clone(),
                    driver: caps.driver.clone(),
                    bus_info: caps.bus.clone(),
                }),
            };
            debug!(name = %device.name, path = %device.path, "Found V4L2 camera");
            cameras.push(device);
        }

        cameras
    }

    fn open_stream(&self, request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>> {
        if !self.is_available() {
            return Err(BackendError::NotAvailable(
                "no access to /dev; V4L2 capture is not possible here".to_string(),
            ));
        }

        let cameras = self.enumerate_cameras();
        let device = match request.select(&cameras) {
            Some(device) => device.clone(),
            None => {
                return Err(match &request.device_path {
                    Some(path) if Path::new(path).exists() => {
                        // Exists but was filtered out: most likely unreadable
                        match Device::with_path(path) {
                            Err(e) => BackendError::from_io(&e, path),
                            Ok(_) => BackendError::FormatNotSupported(format!(
                                "{} is not a video capture device",
                                path
                            )),
                        }
                    }
                    Some(path) => BackendError::DeviceNotFound(path.clone()),
                    None => BackendError::DeviceNotFound("no V4L2 capture devices".to_string()),
                });
            }
        };

        info!(device = %device.name, path = %device.path, "Opening V4L2 camera");
        V4l2Stream::start(device).map(|s| Box::new(s) as Box<dyn CameraStream>)
    }
}

/// A running V4L2 capture
pub struct V4l2Stream {
    device: CameraDevice,
    format: CameraFormat,
    latest: FrameSlot,
    stop_signal: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
}

impl V4l2Stream {
    /// Spawn the capture thread and wait until it either delivered a first
    /// frame or failed to open the device.
    fn start(device: CameraDevice) -> BackendResult<Self> {
        let latest: FrameSlot = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let path = device.path.clone();
        let thread_latest = latest.clone();
        let thread_stop = stop_signal.clone();
        let handle = thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || capture_loop(&path, thread_latest, thread_stop, ready_tx))
            .map_err(|e| BackendError::Other(format!("Failed to spawn capture thread: {}", e)))?;

        let format = match ready_rx.recv() {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(BackendError::Other(
                    "capture thread exited during startup".to_string(),
                ));
            }
        };

        info!(format = %format, "V4L2 stream running");
        Ok(Self {
            device,
            format,
            latest,
            stop_signal,
            capture_thread: Some(handle),
        })
    }
}

impl CameraStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.capture_thread.is_some())
    }

    fn stop(&mut self) {
        let Some(handle) = self.capture_thread.take() else {
            return;
        };
        self.stop_signal.store(true, Ordering::SeqCst);
        if handle.join().is_err() {
            error!("V4L2 capture thread panicked");
        }
        if let Ok(mut guard) = self.latest.lock() {
            *guard = None;
        }
        info!(path = %self.device.path, "V4L2 stream stopped");
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Negotiate a format we can convert, preferring the driver's current size
fn negotiate_format(dev: &Device, path: &str) -> BackendResult<Format> {
    let current = dev.format().map_err(|e| BackendError::from_io(&e, path))?;
    let supported: Vec<FourCC> = dev
        .enum_formats()
        .map(|formats| formats.into_iter().map(|f| f.fourcc).collect())
        .unwrap_or_default();

    for fourcc in PREFERRED_FOURCCS.iter().map(|f| FourCC::new(f)) {
        if !supported.contains(&fourcc) {
            continue;
        }
        let wanted = Format::new(current.width, current.height, fourcc);
        match dev.set_format(&wanted) {
            Ok(actual) if actual.fourcc == fourcc => return Ok(actual),
            Ok(_) => continue,
            Err(e) => {
                debug!(fourcc = %fourcc_name(fourcc), error = %e, "Format rejected");
            }
        }
    }

    Err(BackendError::FormatNotSupported(format!(
        "{} offers none of MJPG/YUYV/UYVY/RGB3/GREY",
        path
    )))
}

fn fourcc_name(fourcc: FourCC) -> String {
    String::from_utf8_lossy(&fourcc.repr).to_string()
}

/// Convert one raw buffer to an RGBA frame
fn convert_buffer(data: &[u8], format: &Format) -> BackendResult<CameraFrame> {
    let (width, height) = (format.width, format.height);
    let rgba = match &format.fourcc.repr {
        b"MJPG" => {
            let (w, h, rgba) = format_converters::mjpeg_to_rgba(data)?;
            return Ok(CameraFrame::from_rgba(w, h, rgba));
        }
        b"YUYV" => format_converters::yuv422_to_rgba(data, width, height, Packed422::Yuyv),
        b"UYVY" => format_converters::yuv422_to_rgba(data, width, height, Packed422::Uyvy),
        b"RGB3" => format_converters::rgb_to_rgba(data),
        b"GREY" => format_converters::gray_to_rgba(data),
        other => {
            return Err(BackendError::FormatNotSupported(
                String::from_utf8_lossy(other).to_string(),
            ));
        }
    };

    if rgba.len() < (width * height * 4) as usize {
        return Err(BackendError::Other("incomplete frame".to_string()));
    }
    Ok(CameraFrame::from_rgba(width, height, rgba))
}

/// Capture loop running in its own thread
fn capture_loop(
    path: &str,
    latest: FrameSlot,
    stop_signal: Arc<AtomicBool>,
    ready: mpsc::Sender<BackendResult<CameraFormat>>,
) {
    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = ready.send(Err(BackendError::from_io(&e, path)));
            return;
        }
    };

    let format = match negotiate_format(&dev, path) {
        Ok(format) => format,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let framerate = dev.params().ok().and_then(|p| {
        (p.interval.numerator > 0).then(|| p.interval.denominator / p.interval.numerator)
    });

    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, 4) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(BackendError::from_io(&e, path)));
            return;
        }
    };

    let camera_format = CameraFormat {
        width: format.width,
        height: format.height,
        framerate,
        pixel_format: fourcc_name(format.fourcc),
    };

    // The first dequeue starts streaming; EBUSY surfaces here
    let mut ready = Some(ready);
    let mut frame_count: u64 = 0;

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Err(BackendError::from_io(&e, path)));
                    return;
                }
                warn!(error = %e, "Failed to dequeue V4L2 buffer");
                thread::sleep(timing::CAPTURE_RETRY_DELAY);
                continue;
            }
        };

        let used = (meta.bytesused as usize).min(buf.len());
        match convert_buffer(&buf[..used], &format) {
            Ok(frame) => {
                if let Ok(mut guard) = latest.lock() {
                    *guard = Some(frame);
                }
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Ok(camera_format.clone()));
                }
            }
            Err(e) => {
                if frame_count >= STARTUP_FRAME_BUDGET
                    && let Some(ready) = ready.take()
                {
                    let _ = ready.send(Err(e));
                    return;
                }
                if frame_count % timing::FRAME_LOG_INTERVAL == 0 {
                    warn!(frame = frame_count, error = %e, "Dropping undecodable frame");
                }
            }
        }
        frame_count += 1;
    }

    debug!(path, frames = frame_count, "V4L2 capture loop stopped");
}
