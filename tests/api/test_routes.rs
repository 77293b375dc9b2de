// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router tests for /transform, /result/:id and /health

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use clap::Parser;
use restyle_node::{
    api::http_server::{build_router, build_state_with_generator},
    config::ServerConfig,
    generation::{GenerationClient, GenerationError, GenerationResult, InlineImage},
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "test-form-boundary";

/// Returns fixed bytes, or no image at all
struct FixedGenerator(Option<Vec<u8>>);

#[async_trait]
impl GenerationClient for FixedGenerator {
    async fn generate(
        &self,
        _instruction: &str,
        _image: &InlineImage,
    ) -> Result<GenerationResult, GenerationError> {
        match &self.0 {
            Some(bytes) => GenerationResult::new(bytes.clone()),
            None => Err(GenerationError::NoImageInResponse),
        }
    }
}

fn config(dir: &Path, api_key: Option<&str>) -> ServerConfig {
    let uploads = dir.join("uploads");
    let results = dir.join("results");
    let mut args = vec![
        "restyle-node".to_string(),
        "--uploads-dir".to_string(),
        uploads.display().to_string(),
        "--results-dir".to_string(),
        results.display().to_string(),
    ];
    if let Some(key) = api_key {
        args.push("--openai-api-key".to_string());
        args.push(key.to_string());
    }
    let mut config = ServerConfig::try_parse_from(args).unwrap();
    config.styles_file = None;
    if api_key.is_none() {
        config.openai_api_key = None;
    }
    config
}

async fn app(dir: &Path, api_key: Option<&str>, output: Option<Vec<u8>>) -> Router {
    let config = config(dir, api_key);
    let state = build_state_with_generator(&config, Arc::new(FixedGenerator(output)))
        .await
        .unwrap();
    build_router(state)
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 120, 250]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Build a multipart body; `file` is (field, filename, content type, bytes)
fn transform_request(style: Option<&str>, file: Option<(&str, &str, &str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(style) = style {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"style\"\r\n\r\n{}\r\n",
                BOUNDARY, style
            )
            .as_bytes(),
        );
    }
    if let Some((field, filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, field, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/transform")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec(), content_type)
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_styles_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), None).await;

    let (status, body, _) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["api_key_configured"], true);
    let styles: Vec<&str> = body["styles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(
        styles,
        vec![
            "sleaze1",
            "sleaze2",
            "sleaze3",
            "shadow",
            "sleazify",
            "megasleaze",
            "ultrasleaze",
            "group",
            "flex"
        ]
    );
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_startup_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let _app = app(dir.path(), Some("sk-test"), None).await;
    assert!(dir.path().join("uploads").is_dir());
    assert!(dir.path().join("results").is_dir());
}

#[tokio::test]
async fn test_result_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), None).await;

    let uri = format!("/result/{}", uuid::Uuid::new_v4());
    let (status, body, _) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Image not found");

    let (status, _, _) = send(app, get("/result/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transform_then_fetch_result() {
    let dir = tempfile::tempdir().unwrap();
    let produced = b"\x89PNG\r\n\x1a\nstub-output".to_vec();
    let app = app(dir.path(), Some("sk-test"), Some(produced.clone())).await;

    let photo = png_bytes();
    let request = transform_request(
        Some("shadow"),
        Some(("image", "me.png", "image/png", photo.as_slice())),
    );
    let (status, body, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["style"], "shadow");
    assert_eq!(body["message"], "Sleaze transformation complete!");
    let image_id = body["image_id"].as_str().unwrap().to_string();

    let (status, bytes, content_type) = send(app, get(&format!("/result/{}", image_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(bytes, produced);

    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_transform_defaults_style() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), Some(vec![1, 2, 3])).await;

    let photo = png_bytes();
    let request = transform_request(None, Some(("image", "me.png", "image/png", photo.as_slice())));
    let (status, body, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["style"], "sleaze1");
}

#[tokio::test]
async fn test_transform_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), Some(vec![1])).await;

    let (status, body, _) = send(app, transform_request(Some("shadow"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["error"], "No image file provided");
    assert_eq!(body["error_type"], "no_file_provided");
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_transform_rejects_non_image() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), Some(vec![1])).await;

    let request = transform_request(
        None,
        Some(("image", "notes.txt", "text/plain", b"hello".as_slice())),
    );
    let (status, body, _) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error_type"], "invalid_request");
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_transform_without_credential() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None, Some(vec![1])).await;

    let photo = png_bytes();
    let request = transform_request(None, Some(("image", "me.png", "image/png", photo.as_slice())));
    let (status, body, _) = send(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["error"], "OpenAI API key not configured");
    assert_eq!(body["error_type"], "configuration_error");
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_transform_generation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some("sk-test"), None).await;

    let photo = png_bytes();
    let request = transform_request(
        Some("flex"),
        Some(("image", "me.png", "image/png", photo.as_slice())),
    );
    let (status, body, _) = send(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["error"], "Failed to process image");
    assert_eq!(body["error_type"], "generation_failure");
    assert_eq!(body["details"], "No image generated in response");
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(dir.path().join("results")).unwrap().count(), 0);
}
