// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end pipeline tests against a scripted generation client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use restyle_node::generation::{GenerationClient, GenerationError, GenerationResult, InlineImage};
use restyle_node::storage::{ResultStore, TempStore};
use restyle_node::styles::StyleCatalog;
use restyle_node::transform::{
    ErrorCategory, Normalizer, PipelineError, Readiness, TransformPipeline, UploadedAsset,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the stub answers with
#[derive(Clone)]
enum Script {
    Image(Vec<u8>),
    NoImage,
}

/// One observed call to the generation service
#[derive(Debug, Clone)]
struct RecordedCall {
    instruction: String,
    mime_type: String,
    image: Vec<u8>,
}

struct ScriptedGenerator {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    async fn generate(
        &self,
        instruction: &str,
        image: &InlineImage,
    ) -> Result<GenerationResult, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            instruction: instruction.to_string(),
            mime_type: image.mime_type().to_string(),
            image: STANDARD.decode(image.base64()).unwrap(),
        });
        match &self.script {
            Script::Image(bytes) => GenerationResult::new(bytes.clone()),
            Script::NoImage => Err(GenerationError::NoImageInResponse),
        }
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    pipeline: TransformPipeline,
    generator: Arc<ScriptedGenerator>,
    catalog: Arc<StyleCatalog>,
}

impl Harness {
    async fn new(script: Script) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let temp_store = TempStore::new(dir.path().join("uploads"));
        temp_store.ensure_dir().await.unwrap();
        let results = ResultStore::new(dir.path().join("results"));
        results.ensure_dir().await.unwrap();

        let catalog = Arc::new(StyleCatalog::builtin().unwrap());
        let generator = ScriptedGenerator::new(script);
        let pipeline = TransformPipeline::new(
            Readiness::new(true),
            temp_store,
            Normalizer::default(),
            catalog.clone(),
            generator.clone(),
            results,
        );

        Self {
            _dir: dir,
            pipeline,
            generator,
            catalog,
        }
    }

    async fn upload(&self, bytes: &[u8], name: &str, mime: &str) -> UploadedAsset {
        let path = self
            .pipeline
            .temp_store()
            .write_upload(bytes, Some(name), mime)
            .await
            .unwrap();
        UploadedAsset::new(path, mime, bytes.len() as u64)
    }

    fn temp_file_count(&self) -> usize {
        count_files(self.pipeline.temp_store().root())
    }

    fn result_file_count(&self) -> usize {
        count_files(self.pipeline.results().root())
    }

    fn instruction(&self, key: &str) -> String {
        self.catalog.get(key).unwrap().template().to_string()
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 200) as u8, (y % 200) as u8, 64])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

fn fake_result() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\ngenerated-result".to_vec()
}

#[tokio::test]
async fn test_shadow_style_on_large_jpeg() {
    let produced = fake_result();
    let harness = Harness::new(Script::Image(produced.clone())).await;
    let upload = harness
        .upload(&jpeg_bytes(2000, 1500), "portrait.jpg", "image/jpeg")
        .await;

    let outcome = harness
        .pipeline
        .run_transform(Some(upload), "shadow")
        .await
        .unwrap();

    assert_eq!(outcome.style, "shadow");
    assert_eq!(outcome.resolved_style, "shadow");
    assert!(outcome.converted);

    let calls = harness.generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].instruction, harness.instruction("shadow"));
    assert_eq!(calls[0].mime_type, "image/png");
    let sent = image::load_from_memory(&calls[0].image).unwrap();
    assert_eq!(sent.dimensions(), (1024, 1024));

    let stored = harness
        .pipeline
        .results()
        .retrieve(&outcome.image.id.to_string())
        .await
        .unwrap();
    assert_eq!(stored, produced);
    assert_eq!(harness.temp_file_count(), 0);
}

#[tokio::test]
async fn test_unknown_style_uses_default_instruction() {
    let harness = Harness::new(Script::Image(fake_result())).await;
    let upload = harness
        .upload(&jpeg_bytes(64, 64), "face.jpg", "image/jpeg")
        .await;

    let outcome = harness
        .pipeline
        .run_transform(Some(upload), "doesnotexist")
        .await
        .unwrap();

    assert_eq!(outcome.style, "doesnotexist");
    assert_eq!(outcome.resolved_style, "sleaze1");
    let calls = harness.generator.calls();
    assert_eq!(calls[0].instruction, harness.instruction("sleaze1"));
    assert!(calls[0].instruction.contains("[CHARACHTER]"));
    assert!(harness
        .pipeline
        .results()
        .contains(&outcome.image.id.to_string())
        .await);
}

#[tokio::test]
async fn test_no_file_creates_nothing() {
    let harness = Harness::new(Script::Image(fake_result())).await;

    let err = harness
        .pipeline
        .run_transform(None, "shadow")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoFileProvided));
    assert_eq!(err.category(), ErrorCategory::NoFileProvided);
    assert!(harness.generator.calls().is_empty());
    assert_eq!(harness.temp_file_count(), 0);
    assert_eq!(harness.result_file_count(), 0);
}

#[tokio::test]
async fn test_response_without_image_is_generation_failure() {
    let harness = Harness::new(Script::NoImage).await;
    let upload = harness
        .upload(&jpeg_bytes(128, 96), "photo.jpg", "image/jpeg")
        .await;

    let err = harness
        .pipeline
        .run_transform(Some(upload), "flex")
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::GenerationFailure);
    assert_eq!(err.detail(), "No image generated in response");
    assert_eq!(harness.generator.calls().len(), 1);
    assert_eq!(harness.temp_file_count(), 0);
    assert_eq!(harness.result_file_count(), 0);
}

#[tokio::test]
async fn test_undecodable_upload_is_sent_as_is() {
    let harness = Harness::new(Script::Image(fake_result())).await;
    let raw = b"not really a photo".to_vec();
    let upload = harness.upload(&raw, "odd.heic", "image/heic").await;

    let outcome = harness
        .pipeline
        .run_transform(Some(upload), "group")
        .await
        .unwrap();

    assert!(!outcome.converted);
    let calls = harness.generator.calls();
    assert_eq!(calls[0].mime_type, "image/heic");
    assert_eq!(calls[0].image, raw);
    assert_eq!(harness.temp_file_count(), 0);
}

#[tokio::test]
async fn test_missing_credential_rejects_before_work() {
    let dir = tempfile::tempdir().unwrap();
    let temp_store = TempStore::new(dir.path().join("uploads"));
    temp_store.ensure_dir().await.unwrap();
    let generator = ScriptedGenerator::new(Script::Image(fake_result()));
    let pipeline = TransformPipeline::new(
        Readiness::from_credential(None),
        temp_store,
        Normalizer::default(),
        Arc::new(StyleCatalog::builtin().unwrap()),
        generator.clone(),
        ResultStore::new(dir.path().join("results")),
    );

    let path = pipeline
        .temp_store()
        .write_upload(b"bytes", Some("a.png"), "image/png")
        .await
        .unwrap();
    let err = pipeline
        .run_transform(Some(UploadedAsset::new(&path, "image/png", 5)), "shadow")
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ConfigurationError);
    assert_eq!(err.to_string(), "OpenAI API key not configured");
    assert!(generator.calls().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_concurrent_requests_do_not_collide() {
    let harness = Harness::new(Script::Image(fake_result())).await;
    let mut uploads = Vec::new();
    for _ in 0..4 {
        uploads.push(
            harness
                .upload(&jpeg_bytes(80, 60), "same-name.jpg", "image/jpeg")
                .await,
        );
    }

    let runs = uploads
        .into_iter()
        .map(|upload| harness.pipeline.run_transform(Some(upload), "sleaze2"));
    let outcomes: Vec<_> = futures::future::join_all(runs)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let mut ids: Vec<_> = outcomes.iter().map(|o| o.image.id.to_string()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(harness.result_file_count(), 4);
    assert_eq!(harness.temp_file_count(), 0);
}

#[test]
fn test_cancelled_request_leaves_no_temp_files() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let photo = jpeg_bytes(2500, 2500);

    let harness = runtime.block_on(async {
        let harness = Harness::new(Script::Image(fake_result())).await;
        let upload = harness.upload(&photo, "huge.jpg", "image/jpeg").await;

        let run = harness.pipeline.run_transform(Some(upload), "shadow");
        let outcome = tokio::time::timeout(Duration::from_millis(20), run).await;
        assert!(outcome.is_err());
        harness
    });

    // Dropping the runtime waits for the abandoned normalization to finish
    drop(runtime);
    assert_eq!(harness.temp_file_count(), 0);
    assert_eq!(harness.result_file_count(), 0);
    assert!(harness.generator.calls().is_empty());
}
