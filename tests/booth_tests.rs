// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end booth workflow through messages

mod common;

use common::{FakeCamera, Reply, mock_server, png_bytes, png_data_url};
use photobooth::backends::camera::BackendError;
use photobooth::capture::CameraModalState;
use photobooth::config::Config;
use photobooth::constants::messages;
use photobooth::image_source::ImageOrigin;
use photobooth::notifications::NotificationKind;
use photobooth::presenter::{QrNode, View};
use photobooth::{Booth, Message};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

struct Fixture {
    booth: Booth,
    camera: Arc<FakeCamera>,
    dir: TempDir,
}

fn fixture(server: &str, camera: FakeCamera) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        server_url: server.to_string(),
        display_name: Some("Ana Peña".to_string()),
        output_dir: Some(dir.path().join("downloads")),
        celebrations: false,
        ..Config::default()
    };
    let camera = Arc::new(camera);
    let booth = Booth::new(config, camera.clone(), None).unwrap();
    Fixture { booth, camera, dir }
}

fn upload_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("portrait.png");
    std::fs::write(&path, png_bytes(10, 12, [120, 80, 60])).unwrap();
    path
}

async fn send(booth: &mut Booth, message: Message) {
    let task = booth.update(message);
    booth.run_until_idle(task).await;
}

fn success_body() -> String {
    format!(
        r#"{{"image":"{}","qrCode":"{}"}}"#,
        png_data_url(8, 8, [10, 60, 200]),
        png_data_url(21, 21, [255, 255, 255])
    )
}

#[tokio::test]
async fn test_generate_without_image_is_rejected() {
    let (base, recorded) = mock_server(|_, _| Reply::Json(200, success_body()));
    let mut f = fixture(&base, FakeCamera::default());

    assert!(!f.booth.can_generate());
    let task = f.booth.update(Message::Generate);
    assert!(task.is_none());

    let toast = f.booth.notifications().visible().unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, messages::IMAGE_REQUIRED);
    assert!(f.booth.is_highlighted(Instant::now()));
    assert!(recorded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_generate_download_reset() {
    let (base, recorded) = mock_server(|_, _| Reply::Json(200, success_body()));
    let mut f = fixture(&base, FakeCamera::default());
    let path = upload_file(&f.dir);

    send(&mut f.booth, Message::UploadSelected(Some(path.clone()))).await;
    assert!(f.booth.source().is_valid());
    assert!(f.booth.can_generate());
    assert_eq!(
        f.booth.source().active().unwrap().origin,
        ImageOrigin::Upload(path)
    );

    send(&mut f.booth, Message::Generate).await;
    assert!(!f.booth.is_generating());
    assert_eq!(f.booth.presenter().view(), View::Result);
    assert!(!f.booth.presenter().prompt_text().is_empty());
    assert_eq!(
        f.booth.notifications().visible().unwrap().message,
        messages::GENERATION_SUCCEEDED
    );

    // A second successful generation must not pile up QR nodes
    send(&mut f.booth, Message::Generate).await;
    let nodes = f.booth.presenter().qr_panel().nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(
        nodes.iter().filter(|n| matches!(n, QrNode::Image(_))).count(),
        1
    );
    assert_eq!(recorded.lock().unwrap().len(), 2);

    send(&mut f.booth, Message::Download).await;
    let saved = f.booth.presenter().last_download().unwrap().clone();
    assert!(saved.exists());
    let name = saved.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("GraduationPhoto_Ana_Peña_"), "{}", name);
    assert!(name.ends_with(".png"));
    assert_eq!(
        f.booth.notifications().visible().unwrap().message,
        messages::DOWNLOADED
    );

    send(&mut f.booth, Message::Reset).await;
    assert!(!f.booth.source().is_valid());
    assert!(!f.booth.can_generate());
    assert_eq!(f.booth.presenter().view(), View::Form);
    assert!(f.booth.presenter().result().is_none());
    assert!(f.booth.presenter().qr_panel().is_empty());
    assert!(f.booth.presenter().prompt_text().is_empty());
    assert!(f.booth.presenter().last_download().is_none());
}

#[tokio::test]
async fn test_failed_generation_keeps_image() {
    let (base, _) = mock_server(|_, _| Reply::Json(400, r#"{"error":"bad image"}"#.to_string()));
    let mut f = fixture(&base, FakeCamera::default());
    let path = upload_file(&f.dir);
    send(&mut f.booth, Message::UploadSelected(Some(path))).await;
    let before = f.booth.source().active().cloned();

    send(&mut f.booth, Message::Generate).await;

    let toast = f.booth.notifications().visible().unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, "bad image");
    assert_eq!(f.booth.source().active().cloned(), before);
    assert!(f.booth.can_generate(), "user may retry");
    assert_eq!(f.booth.presenter().view(), View::Form);
}

#[tokio::test]
async fn test_generate_is_ignored_while_in_flight() {
    let (base, recorded) = mock_server(|_, _| Reply::Json(200, success_body()));
    let mut f = fixture(&base, FakeCamera::default());
    let path = upload_file(&f.dir);
    send(&mut f.booth, Message::UploadSelected(Some(path))).await;

    let first = f.booth.update(Message::Generate);
    assert!(f.booth.is_generating());
    assert!(!f.booth.can_generate());
    let second = f.booth.update(Message::Generate);
    assert!(second.is_none());

    f.booth.run_until_idle(first).await;
    assert_eq!(recorded.lock().unwrap().len(), 1);
    assert!(!f.booth.is_generating());
}

#[tokio::test(start_paused = true)]
async fn test_camera_capture_supersedes_upload() {
    let mut f = fixture("http://127.0.0.1:9", FakeCamera::default());
    let path = upload_file(&f.dir);
    send(&mut f.booth, Message::UploadSelected(Some(path))).await;

    send(&mut f.booth, Message::OpenCamera).await;
    assert_eq!(f.booth.camera_state(), CameraModalState::Streaming);
    assert_eq!(f.camera.live(), 1);

    send(&mut f.booth, Message::StartCountdown).await;

    assert_eq!(f.camera.snapshots(), 1);
    assert_eq!(f.camera.live(), 0);
    assert_eq!(f.booth.camera_state(), CameraModalState::Closed);
    let active = f.booth.source().active().unwrap();
    assert_eq!(active.origin, ImageOrigin::Camera);
    assert_eq!(active.image.dimensions(), (8, 6));
}

#[tokio::test]
async fn test_camera_error_raises_alert_and_closes() {
    let mut f = fixture(
        "http://127.0.0.1:9",
        FakeCamera::failing(BackendError::DeviceBusy("/dev/video0".into())),
    );

    send(&mut f.booth, Message::OpenCamera).await;

    let alert = f.booth.alert().unwrap();
    assert!(alert.contains("another application"));
    assert!(alert.contains("/dev/video0"));
    assert_eq!(f.booth.camera_state(), CameraModalState::Closed);
    // Camera problems are alerts, not toasts
    assert!(f.booth.notifications().visible().is_none());

    send(&mut f.booth, Message::DismissAlert).await;
    assert!(f.booth.alert().is_none());
}

#[tokio::test]
async fn test_closing_camera_while_opening_releases_it() {
    let mut f = fixture("http://127.0.0.1:9", FakeCamera::default());

    let opening = f.booth.update(Message::OpenCamera);
    assert_eq!(f.booth.camera_state(), CameraModalState::Requesting);
    let _ = f.booth.update(Message::CloseCamera);
    f.booth.run_until_idle(opening).await;

    assert_eq!(f.booth.camera_state(), CameraModalState::Closed);
    assert_eq!(f.camera.live(), 0);
}

#[tokio::test]
async fn test_health_warns_about_missing_key() {
    let (base, _) = mock_server(|_, _| Reply::Json(200, r#"{"hasApiKey":false}"#.to_string()));
    let mut f = fixture(&base, FakeCamera::default());

    let init = f.booth.init();
    f.booth.run_until_idle(init).await;

    assert_eq!(f.booth.health().map(|h| h.has_api_key), Some(false));
    assert_eq!(
        f.booth.notifications().visible().unwrap().message,
        messages::MISSING_API_KEY
    );
}

#[tokio::test]
async fn test_health_failure_is_silent() {
    let mut f = fixture("http://127.0.0.1:9", FakeCamera::default());
    let init = f.booth.init();
    f.booth.run_until_idle(init).await;

    assert!(f.booth.health().is_none());
    assert!(f.booth.notifications().visible().is_none());
}

#[tokio::test]
async fn test_remove_image_disables_generate() {
    let mut f = fixture("http://127.0.0.1:9", FakeCamera::default());
    let path = upload_file(&f.dir);
    send(&mut f.booth, Message::UploadSelected(Some(path))).await;
    assert!(f.booth.can_generate());

    send(&mut f.booth, Message::RemoveImage).await;
    assert!(!f.booth.source().is_valid());
    assert!(!f.booth.can_generate());
}
