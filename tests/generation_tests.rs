// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the generation client against a mock server

mod common;

use common::{Reply, mock_server, png_bytes, png_data_url};
use photobooth::constants::messages;
use photobooth::errors::GenerationError;
use photobooth::generation::{GenerationClient, GenerationContext, PromptTemplate, Track};
use photobooth::image_source::{CapturedImage, EncodedImage, ImageOrigin};

fn source_image() -> CapturedImage {
    CapturedImage {
        image: EncodedImage::from_bytes(png_bytes(4, 4, [10, 20, 30])).unwrap(),
        origin: ImageOrigin::Camera,
    }
}

fn context() -> GenerationContext {
    GenerationContext {
        display_name: "Ana".to_string(),
        track: Some(Track {
            name: "Gastronomy".to_string(),
        }),
    }
}

fn client(base: &str) -> GenerationClient {
    GenerationClient::new(
        base,
        PromptTemplate::new("Portrait, {track} graduate", "the selected program"),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn test_generate_sends_multipart_image_and_prompt() {
    let image_url = png_data_url(6, 6, [200, 180, 20]);
    let qr_url = png_data_url(21, 21, [255, 255, 255]);
    let body = format!(r#"{{"image":"{}","qrCode":"{}"}}"#, image_url, qr_url);
    let (base, recorded) = mock_server(move |_, _| Reply::Json(200, body.clone()));

    let result = client(&base)
        .generate(&source_image(), &context())
        .await
        .unwrap();

    assert_eq!(result.image.dimensions(), (6, 6));
    assert!(result.image_url.is_none());
    assert_eq!(result.qr_code.as_ref().map(|q| q.dimensions()), Some((21, 21)));
    assert_eq!(result.prompt, "Portrait, Gastronomy graduate");

    let requests = recorded.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/generate");
    assert!(request.content_type.starts_with("multipart/form-data"));
    let text = request.body_text();
    assert!(text.contains(r#"name="image"; filename="captured.png""#));
    assert!(text.contains(r#"name="prompt""#));
    assert!(text.contains("Portrait, Gastronomy graduate"));
}

#[tokio::test]
async fn test_generate_surfaces_backend_error_message() {
    let (base, _) = mock_server(|_, _| Reply::Json(400, r#"{"error":"bad image"}"#.to_string()));

    let err = client(&base)
        .generate(&source_image(), &context())
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::Failed("bad image".to_string()));
    assert_eq!(err.to_string(), "bad image");
}

#[tokio::test]
async fn test_generate_without_error_field_uses_generic_message() {
    let (base, _) = mock_server(|_, _| Reply::Json(500, "upstream exploded".to_string()));

    let err = client(&base)
        .generate(&source_image(), &context())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), messages::GENERATION_FAILED);
}

#[tokio::test]
async fn test_generate_fetches_relative_image_url() {
    let (base, recorded) = mock_server(|_, url| {
        if url == "/api/generate" {
            Reply::Json(200, r#"{"image":"/generated/42.png"}"#.to_string())
        } else {
            Reply::Png(png_bytes(3, 5, [1, 1, 1]))
        }
    });

    let result = client(&base)
        .generate(&source_image(), &context())
        .await
        .unwrap();

    assert_eq!(result.image.dimensions(), (3, 5));
    assert_eq!(
        result.image_url.as_ref().map(|u| u.path()),
        Some("/generated/42.png")
    );
    assert!(result.qr_code.is_none());
    assert_eq!(recorded.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_track_uses_default_phrase() {
    let (base, recorded) = mock_server(move |_, _| {
        Reply::Json(200, format!(r#"{{"image":"{}"}}"#, png_data_url(2, 2, [0, 0, 0])))
    });
    let context = GenerationContext {
        display_name: String::new(),
        track: None,
    };

    let result = client(&base).generate(&source_image(), &context).await.unwrap();
    assert_eq!(result.prompt, "Portrait, the selected program graduate");
    assert!(recorded.lock().unwrap()[0]
        .body_text()
        .contains("the selected program"));
}

#[tokio::test]
async fn test_health_reports_api_key() {
    let (base, recorded) = mock_server(|_, _| Reply::Json(200, r#"{"hasApiKey":false}"#.to_string()));

    let status = client(&base).check_health().await.unwrap();
    assert!(!status.has_api_key);

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/health");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Port 9 (discard) is closed on test machines
    let err = client("http://127.0.0.1:9")
        .check_health()
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}
