use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use metastrip::{
    Category, ErrorKind, Pipeline, PipelineConfig, PipelineError, PipelineObserver, RequestId,
    Stage, UploadRequest, ZIP_CONTENT_TYPE,
};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

fn jpeg_bytes(seed: u8) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 8, |x, y| {
        Rgb([seed, (x * 30) as u8, (y * 30) as u8])
    }));
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg).unwrap();
    out
}

fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(4, 4, |x, y| {
        Rgb([(x * 60) as u8, (y * 60) as u8, 9])
    }));
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

fn zip_of(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("metastrip-pipeline-")
            .tempdir()
            .unwrap();
        let root = dir.path().join("temp");
        Self { _dir: dir, root }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            workspace_root: self.root.clone(),
            ..PipelineConfig::default()
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config())
    }

    fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(&self.root) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

fn upload(bytes: Vec<u8>) -> UploadRequest {
    UploadRequest::new("alice@example.com", ZIP_CONTENT_TYPE, bytes)
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<Stage>>,
}

impl PipelineObserver for Recorder {
    fn on_transition(&self, _: &RequestId, stage: Stage, _: Option<&Path>) {
        self.stages.lock().unwrap().push(stage);
    }
}

/// Runs `action` on the images directory right after `at` is reached.
struct Inject {
    at: Stage,
    action: fn(&Path),
}

impl PipelineObserver for Inject {
    fn on_transition(&self, _: &RequestId, stage: Stage, images_dir: Option<&Path>) {
        if stage == self.at {
            if let Some(images) = images_dir {
                (self.action)(images);
            }
        }
    }
}

fn injected(fixture: &Fixture, at: Stage, action: fn(&Path)) -> Pipeline {
    fixture
        .pipeline()
        .with_observer(Arc::new(Inject { at, action }))
}

#[test]
fn single_jpeg_yields_image_and_sidecar() {
    let fixture = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let pipeline = fixture.pipeline().with_observer(recorder.clone());

    let request = upload(zip_of(&[("photo.jpg", jpeg_bytes(1))]));
    let id = request.id.clone();
    let result = pipeline.process(request).unwrap();

    assert_eq!(result.request_id, id);
    assert_eq!(result.filename, "images.zip");
    assert_eq!(result.content_type, "application/zip");
    assert_eq!(result.entry_count, 2);
    assert_eq!(entry_names(&result.archive), ["photo.jpg", "photo_meta.json"]);
    assert_eq!(fixture.leftover_workspaces(), 0);

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        [
            Stage::Received,
            Stage::WorkspaceCreated,
            Stage::Validated,
            Stage::Saved,
            Stage::Extracted,
            Stage::MetadataProcessed,
            Stage::Assembled,
            Stage::Completed,
        ]
    );
}

#[test]
fn n_images_give_2n_entries() {
    let fixture = Fixture::new();
    let files: Vec<(&str, Vec<u8>)> = vec![
        ("a.jpg", jpeg_bytes(1)),
        ("b.jpeg", jpeg_bytes(2)),
        ("c.png", png_bytes()),
    ];

    let result = fixture.pipeline().process(upload(zip_of(&files))).unwrap();

    assert_eq!(result.entry_count, 6);
    assert_eq!(
        entry_names(&result.archive),
        ["a.jpg", "a_meta.json", "b.jpeg", "b_meta.json", "c.png", "c_meta.json"]
    );
}

fn expect_failure(pipeline: &Pipeline, bytes: Vec<u8>) -> PipelineError {
    pipeline.process(upload(bytes)).unwrap_err()
}

#[test]
fn text_member_is_a_caller_error() {
    let fixture = Fixture::new();
    let err = expect_failure(
        &fixture.pipeline(),
        zip_of(&[("test_file.txt", b"hello".to_vec())]),
    );

    assert_eq!(err.kind(), ErrorKind::DisallowedMember);
    assert_eq!(err.category(), Category::Caller);
    let failure = err.to_failure();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.message, "Non-image file detected in upload");
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn upper_case_extension_is_not_an_allowed_image() {
    let fixture = Fixture::new();
    let err = expect_failure(&fixture.pipeline(), zip_of(&[("PHOTO.JPG", jpeg_bytes(1))]));

    assert_eq!(err.kind(), ErrorKind::DisallowedMember);
    let failure = err.to_failure();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.message, "Non-image file detected in upload");
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn oversized_upload_is_a_caller_error() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(PipelineConfig {
        size_limit: 1_000_000,
        ..fixture.config()
    });

    let err = expect_failure(&pipeline, zip_of(&[("big.jpg", vec![0xAB; 1_500_000])]));

    assert_eq!(err.kind(), ErrorKind::SizeLimitExceeded);
    let failure = err.to_failure();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.message, "Zip file exceeds size limit of 1 MB");
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn extraction_budget_overrun_reports_the_upload_limit() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(PipelineConfig {
        max_entry_bytes: 100,
        ..fixture.config()
    });

    let err = expect_failure(&pipeline, zip_of(&[("photo.jpg", jpeg_bytes(1))]));

    assert_eq!(err.kind(), ErrorKind::SizeLimitExceeded);
    let failure = err.to_failure();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.message, "Zip file exceeds size limit of 100 MB");
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn empty_zip_is_a_caller_error() {
    let fixture = Fixture::new();
    let err = expect_failure(&fixture.pipeline(), zip_of(&[]));

    assert_eq!(err.kind(), ErrorKind::EmptyArchive);
    assert_eq!(err.to_failure().message, "Zip file is empty");
    assert_eq!(err.to_failure().status, 400);
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn corrupt_zip_is_a_caller_error() {
    let fixture = Fixture::new();
    let err = expect_failure(&fixture.pipeline(), b"PK\x03\x04 not really".to_vec());

    assert_eq!(err.kind(), ErrorKind::CorruptArchive);
    assert_eq!(err.to_failure().message, "Zip file is corrupted");
}

#[test]
fn wrong_content_type_is_rejected_before_any_workspace() {
    let fixture = Fixture::new();
    let request = UploadRequest::new(
        "alice",
        "multipart/form-data",
        zip_of(&[("photo.jpg", jpeg_bytes(1))]),
    );

    let err = fixture.pipeline().process(request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedContentType);
    assert_eq!(err.to_failure().message, "Request is missing zipfile");
    assert!(!fixture.root.exists());
}

#[test]
fn image_that_does_not_decode_is_unsupported() {
    let fixture = Fixture::new();
    let err = expect_failure(
        &fixture.pipeline(),
        zip_of(&[("photo.jpg", jpeg_bytes(1)), ("fake.png", b"not a png".to_vec())]),
    );

    assert_eq!(err.kind(), ErrorKind::UnsupportedFile);
    assert_eq!(err.category(), Category::Caller);
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn colliding_sanitized_names_are_rejected() {
    let fixture = Fixture::new();
    let err = expect_failure(
        &fixture.pipeline(),
        zip_of(&[("photo.jpg", jpeg_bytes(1)), ("../photo.jpg", jpeg_bytes(2))]),
    );

    assert_eq!(err.kind(), ErrorKind::DuplicateMember);
    assert_eq!(err.to_failure().status, 400);
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn traversal_names_stay_inside_the_workspace() {
    let fixture = Fixture::new();
    let result = fixture
        .pipeline()
        .process(upload(zip_of(&[("../../escape.jpg", jpeg_bytes(1))])))
        .unwrap();

    assert_eq!(entry_names(&result.archive), ["escape.jpg", "escape_meta.json"]);
    assert!(!fixture.root.parent().unwrap().join("escape.jpg").exists());
}

#[test]
fn teardown_after_extraction_failure() {
    let fixture = Fixture::new();
    let pipeline = injected(&fixture, Stage::Saved, |images| {
        let upload = images.parent().unwrap().join("upload.zip");
        std::fs::remove_file(upload).unwrap();
    });

    let err = expect_failure(&pipeline, zip_of(&[("photo.jpg", jpeg_bytes(1))]));

    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    let failure = err.to_failure();
    assert_eq!(failure.status, 500);
    assert_eq!(
        failure.message,
        "Internal error occurred while processing images: failed to unzip files"
    );
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn teardown_after_metadata_failure() {
    let fixture = Fixture::new();
    let pipeline = injected(&fixture, Stage::Extracted, |images| {
        std::fs::write(images.join("photo_meta.json"), b"{}").unwrap();
    });

    let err = expect_failure(&pipeline, zip_of(&[("photo.jpg", jpeg_bytes(1))]));

    assert_eq!(err.kind(), ErrorKind::SidecarCollision);
    assert_eq!(err.to_failure().status, 400);
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn images_sharing_a_stem_are_rejected_with_a_clear_message() {
    let fixture = Fixture::new();
    let err = expect_failure(
        &fixture.pipeline(),
        zip_of(&[("a.jpg", jpeg_bytes(1)), ("a.png", png_bytes())]),
    );

    assert_eq!(err.kind(), ErrorKind::SidecarCollision);
    assert_eq!(err.category(), Category::Caller);
    let failure = err.to_failure();
    assert_eq!(failure.status, 400);
    assert_eq!(
        failure.message,
        "Upload contains images whose names differ only by extension"
    );
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn teardown_after_assembly_failure() {
    let fixture = Fixture::new();
    let pipeline = injected(&fixture, Stage::MetadataProcessed, |images| {
        std::fs::write(images.join("notes.txt"), b"sneaky").unwrap();
    });

    let err = expect_failure(&pipeline, zip_of(&[("photo.jpg", jpeg_bytes(1))]));

    assert_eq!(err.kind(), ErrorKind::IllegalFile);
    assert_eq!(err.to_failure().message, "Non-image file detected in upload");
    assert_eq!(fixture.leftover_workspaces(), 0);
}

#[test]
fn failure_is_the_last_transition() {
    let fixture = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let pipeline = fixture.pipeline().with_observer(recorder.clone());

    let err = expect_failure(&pipeline, zip_of(&[]));

    assert_eq!(err.kind(), ErrorKind::EmptyArchive);
    assert_eq!(
        *recorder.stages.lock().unwrap(),
        [
            Stage::Received,
            Stage::WorkspaceCreated,
            Stage::Validated,
            Stage::Saved,
            Stage::Failed(ErrorKind::EmptyArchive),
        ]
    );
}

#[test]
fn live_request_id_cannot_be_reused() {
    let fixture = Fixture::new();
    let id = RequestId::parse("shared-id").unwrap();
    let base = fixture.root.join(id.as_str());
    std::fs::create_dir_all(&base).unwrap();
    std::fs::write(base.join("owner.txt"), b"still here").unwrap();

    let request = upload(zip_of(&[("photo.jpg", jpeg_bytes(1))])).with_id(id);
    let err = fixture.pipeline().process(request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WorkspaceExists);
    let failure = err.to_failure();
    assert_eq!(failure.status, 500);
    assert_eq!(
        failure.message,
        "Internal error occurred while processing images: failed to create temp folder"
    );
    assert!(base.join("owner.txt").exists());
}

#[test]
fn concurrent_uploads_are_isolated() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let pipeline = &pipeline;
                scope.spawn(move || {
                    let name = format!("img_{i}.jpg");
                    let bytes = zip_of(&[(name.as_str(), jpeg_bytes(i))]);
                    (i, pipeline.process(upload(bytes)))
                })
            })
            .collect();

        for handle in handles {
            let (i, result) = handle.join().unwrap();
            let result = result.unwrap();
            assert_eq!(
                entry_names(&result.archive),
                [format!("img_{i}.jpg"), format!("img_{i}_meta.json")]
            );
        }
    });

    assert_eq!(fixture.leftover_workspaces(), 0);
}
