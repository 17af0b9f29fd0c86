// SPDX-License-Identifier: GPL-3.0-only

//! Shared test doubles: a counting camera and a mock generation server

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use photobooth::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraDevice, CameraFormat, CameraFrame,
    CameraStream, StreamRequest,
};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Response, Server};

/// Camera that counts live tracks and snapshots
#[derive(Default)]
pub struct FakeCamera {
    pub live_tracks: Arc<AtomicUsize>,
    pub opens: Arc<AtomicUsize>,
    pub snapshots: Arc<AtomicUsize>,
    pub fail_with: Option<BackendError>,
}

impl FakeCamera {
    pub fn failing(error: BackendError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn live(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

fn fake_device() -> CameraDevice {
    CameraDevice {
        name: "Integrated Webcam".to_string(),
        path: "/dev/video0".to_string(),
        device_info: None,
    }
}

impl CameraBackend for FakeCamera {
    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![fake_device()]
    }

    fn open_stream(&self, _request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.live_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            device: fake_device(),
            format: CameraFormat {
                width: 8,
                height: 6,
                framerate: Some(30),
                pixel_format: "YUYV".to_string(),
            },
            live_tracks: self.live_tracks.clone(),
            snapshots: self.snapshots.clone(),
            running: true,
        }))
    }
}

struct FakeStream {
    device: CameraDevice,
    format: CameraFormat,
    live_tracks: Arc<AtomicUsize>,
    snapshots: Arc<AtomicUsize>,
    running: bool,
}

impl CameraStream for FakeStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        if !self.running {
            return None;
        }
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Some(CameraFrame::from_rgba(8, 6, vec![90; 8 * 6 * 4]))
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.running)
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.live_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn png_data_url(width: u32, height: u32, rgb: [u8; 3]) -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png_bytes(width, height, rgb))
    )
}

/// Request seen by the mock server
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// Reply produced by a route
pub enum Reply {
    Json(u16, String),
    Png(Vec<u8>),
}

/// Start a server answering every request through `route`
pub fn mock_server<F>(route: F) -> (String, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(&str, &str) -> Reply + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let log = recorded.clone();

    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = Vec::new();
            let _ = request.as_reader().read_to_end(&mut body);
            let method = request.method().to_string();
            let url = request.url().to_string();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.to_string())
                .unwrap_or_default();
            log.lock().unwrap().push(Recorded {
                method: method.clone(),
                url: url.clone(),
                content_type,
                body,
            });

            let _ = match route(&method, &url) {
                Reply::Json(status, json) => request.respond(
                    Response::from_string(json)
                        .with_status_code(status)
                        .with_header(
                            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                                .unwrap(),
                        ),
                ),
                Reply::Png(bytes) => request.respond(
                    Response::from_data(bytes).with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"image/png"[..]).unwrap(),
                    ),
                ),
            };
        }
    });

    (base, recorded)
}
