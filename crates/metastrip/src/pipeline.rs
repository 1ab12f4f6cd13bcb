use std::fmt;
use std::path::Path;
use std::sync::Arc;

use metastrip_archive::{
    ExtractOptions, IntakePolicy, assemble_archive, extract_archive, validate_upload,
};
use metastrip_fs::{Workspace, atomic_write};
use metastrip_image::process_directory;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::request::{RequestId, UploadRequest, ZIP_CONTENT_TYPE, is_zip_content_type};

/// Lifecycle of one upload. Stages are entered in declaration order; `Failed`
/// can follow any stage before `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    WorkspaceCreated,
    Validated,
    Saved,
    Extracted,
    MetadataProcessed,
    Assembled,
    Completed,
    Failed(crate::ErrorKind),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::WorkspaceCreated => f.write_str("workspace_created"),
            Self::Validated => f.write_str("validated"),
            Self::Saved => f.write_str("saved"),
            Self::Extracted => f.write_str("extracted"),
            Self::MetadataProcessed => f.write_str("metadata_processed"),
            Self::Assembled => f.write_str("assembled"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Hook notified after every stage transition.
///
/// `images_dir` is the workspace's images directory while the workspace
/// exists, and `None` before it is created or after it is removed.
pub trait PipelineObserver: Send + Sync {
    fn on_transition(&self, request_id: &RequestId, stage: Stage, images_dir: Option<&Path>);
}

/// Observer that ignores every transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_transition(&self, _: &RequestId, _: Stage, _: Option<&Path>) {}
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct ProcessedUpload {
    pub request_id: RequestId,
    /// The result zip, held in memory only.
    pub archive: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
    /// Images plus their sidecars.
    pub entry_count: usize,
}

/// Runs uploads through validation, extraction, EXIF removal and assembly.
///
/// Holds only immutable configuration, so a single instance may serve
/// concurrent requests.
pub struct Pipeline {
    config: PipelineConfig,
    intake: IntakePolicy,
    extract: ExtractOptions,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            intake: config.intake_policy(),
            extract: config.extract_options(),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one upload. Any workspace created for it is gone by the time
    /// this returns.
    pub fn process(&self, request: UploadRequest) -> Result<ProcessedUpload, PipelineError> {
        let span = tracing::info_span!(
            "upload",
            request_id = %request.id,
            caller = %request.caller,
        );
        let _enter = span.enter();

        tracing::info!(bytes = request.bytes.len(), "received upload");
        self.observer.on_transition(&request.id, Stage::Received, None);

        let result = self.run(&request);
        match &result {
            Ok(upload) => {
                tracing::info!(entries = upload.entry_count, "upload completed");
                self.observer
                    .on_transition(&request.id, Stage::Completed, None);
            }
            Err(e) => {
                let kind = e.kind();
                tracing::error!(%kind, error = %e, "upload failed");
                self.observer
                    .on_transition(&request.id, Stage::Failed(kind), None);
            }
        }
        result
    }

    fn run(&self, request: &UploadRequest) -> Result<ProcessedUpload, PipelineError> {
        if !is_zip_content_type(&request.content_type) {
            return Err(PipelineError::UnexpectedContentType {
                content_type: request.content_type.clone(),
            });
        }

        let workspace = Workspace::create(&self.config.workspace_root, request.id.as_str())
            .map_err(PipelineError::Workspace)?;
        self.advance(&request.id, Stage::WorkspaceCreated, workspace.images());

        let outcome = self.run_in(&workspace, request);

        let base = workspace.base().to_path_buf();
        match workspace.destroy() {
            Ok(()) => tracing::debug!(path = %base.display(), "workspace removed"),
            Err(e) => tracing::error!(error = %e, "failed to remove workspace"),
        }
        outcome
    }

    fn run_in(
        &self,
        workspace: &Workspace,
        request: &UploadRequest,
    ) -> Result<ProcessedUpload, PipelineError> {
        let id = &request.id;
        let images = workspace.images();

        let intake = validate_upload(&request.bytes, &self.intake)?;
        tracing::debug!(members = intake.member_count, "upload validated");
        self.advance(id, Stage::Validated, images);

        let upload_path = workspace.base().join(&self.config.upload_name);
        atomic_write(&upload_path, &request.bytes).map_err(PipelineError::SaveFailed)?;
        self.advance(id, Stage::Saved, images);

        let extracted =
            extract_archive(&upload_path, images, &self.extract).map_err(|e| match e {
                metastrip_archive::Error::ExtractionBudgetExceeded { .. } => {
                    PipelineError::ContentTooLarge {
                        size_limit: self.config.size_limit,
                        source: e,
                    }
                }
                other => other.into(),
            })?;
        tracing::debug!(
            files = extracted.entry_count(),
            bytes = extracted.total_bytes,
            "archive extracted"
        );
        self.advance(id, Stage::Extracted, images);

        let records = process_directory(images)?;
        self.advance(id, Stage::MetadataProcessed, images);

        let archive = assemble_archive(images)?;
        self.advance(id, Stage::Assembled, images);

        Ok(ProcessedUpload {
            request_id: id.clone(),
            archive,
            filename: self.config.output_name.clone(),
            content_type: ZIP_CONTENT_TYPE,
            entry_count: extracted.entry_count() + records.len(),
        })
    }

    fn advance(&self, id: &RequestId, stage: Stage, images: &Path) {
        tracing::info!(%stage, "stage complete");
        self.observer.on_transition(id, stage, Some(images));
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
