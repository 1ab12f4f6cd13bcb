use std::fmt;

use metastrip_archive::options::DEFAULT_SIZE_LIMIT;
use serde::Serialize;

/// Prefix of every caller-visible message for an internal failure.
const INTERNAL_PREFIX: &str = "Internal error occurred while processing images";

/// Failure taxonomy of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnexpectedContentType,
    SizeLimitExceeded,
    DisallowedMember,
    IllegalFile,
    CorruptArchive,
    EmptyArchive,
    DuplicateMember,
    /// Two images share a stem, so their sidecars would collide.
    SidecarCollision,
    UnsupportedFile,
    MetadataExtractionFailed,
    WorkspaceExists,
    InvalidRequestId,
    SaveFailed,
    SourceNotFound,
    ExtractionFailed,
    AssemblyFailed,
}

impl ErrorKind {
    pub fn category(self) -> Category {
        match self {
            Self::UnexpectedContentType
            | Self::SizeLimitExceeded
            | Self::DisallowedMember
            | Self::IllegalFile
            | Self::CorruptArchive
            | Self::EmptyArchive
            | Self::DuplicateMember
            | Self::SidecarCollision
            | Self::UnsupportedFile
            | Self::MetadataExtractionFailed => Category::Caller,
            Self::WorkspaceExists
            | Self::InvalidRequestId
            | Self::SaveFailed
            | Self::SourceNotFound
            | Self::ExtractionFailed
            | Self::AssemblyFailed => Category::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Who is responsible for a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// The upload itself was unacceptable.
    Caller,
    Internal,
}

impl Category {
    /// HTTP status the transport layer should answer with.
    pub fn status(self) -> u16 {
        match self {
            Self::Caller => 400,
            Self::Internal => 500,
        }
    }
}

/// Caller-visible rendering of a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    pub status: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("expected an application/zip upload, got '{content_type}'")]
    UnexpectedContentType { content_type: String },

    #[error("invalid request id '{0}'")]
    InvalidRequestId(String),

    #[error("failed to create workspace: {0}")]
    Workspace(#[source] metastrip_fs::Error),

    #[error("failed to save upload: {0}")]
    SaveFailed(#[source] metastrip_fs::Error),

    /// The upload passed the size check but inflates past the extraction
    /// budget. Reported against the configured upload limit.
    #[error("upload exceeds the extraction budget: {source}")]
    ContentTooLarge {
        size_limit: u64,
        #[source]
        source: metastrip_archive::Error,
    },

    #[error(transparent)]
    Archive(#[from] metastrip_archive::Error),

    #[error(transparent)]
    Image(#[from] metastrip_image::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        use metastrip_archive::Error as A;
        use metastrip_image::Error as I;

        match self {
            Self::UnexpectedContentType { .. } => ErrorKind::UnexpectedContentType,
            Self::InvalidRequestId(_) => ErrorKind::InvalidRequestId,
            Self::Workspace(metastrip_fs::Error::InvalidId(_)) => ErrorKind::InvalidRequestId,
            Self::Workspace(_) => ErrorKind::WorkspaceExists,
            Self::SaveFailed(_) => ErrorKind::SaveFailed,
            Self::ContentTooLarge { .. } => ErrorKind::SizeLimitExceeded,
            Self::Archive(e) => match e {
                A::SizeLimitExceeded { .. } | A::ExtractionBudgetExceeded { .. } => {
                    ErrorKind::SizeLimitExceeded
                }
                A::DisallowedMember { .. } | A::InvalidEntryName { .. } => ErrorKind::DisallowedMember,
                A::CorruptArchive => ErrorKind::CorruptArchive,
                A::EmptyArchive => ErrorKind::EmptyArchive,
                A::DuplicateEntry { .. } => ErrorKind::DuplicateMember,
                A::SourceNotFound { .. } => ErrorKind::SourceNotFound,
                A::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
                A::IllegalFile { .. } => ErrorKind::IllegalFile,
                A::AssemblyFailed { .. } => ErrorKind::AssemblyFailed,
            },
            Self::Image(e) => match e {
                I::UnsupportedFile { .. } => ErrorKind::UnsupportedFile,
                I::MetadataExtractionFailed { .. } => ErrorKind::MetadataExtractionFailed,
                I::SidecarExists { .. } => ErrorKind::SidecarCollision,
            },
        }
    }

    pub fn category(&self) -> Category {
        self.kind().category()
    }

    /// Message and status for the caller. Internal details stay in the logs.
    pub fn to_failure(&self) -> Failure {
        let message = match self.kind() {
            ErrorKind::UnexpectedContentType => "Request is missing zipfile".to_string(),
            ErrorKind::SizeLimitExceeded => {
                let limit = match self {
                    Self::Archive(metastrip_archive::Error::SizeLimitExceeded { limit, .. }) => *limit,
                    Self::ContentTooLarge { size_limit, .. } => *size_limit,
                    _ => DEFAULT_SIZE_LIMIT,
                };
                format!("Zip file exceeds size limit of {} MB", limit / 1_000_000)
            }
            ErrorKind::DisallowedMember | ErrorKind::IllegalFile => {
                "Non-image file detected in upload".to_string()
            }
            ErrorKind::CorruptArchive => "Zip file is corrupted".to_string(),
            ErrorKind::EmptyArchive => "Zip file is empty".to_string(),
            ErrorKind::DuplicateMember => {
                "Upload contains files whose names collide after sanitization".to_string()
            }
            ErrorKind::SidecarCollision => {
                "Upload contains images whose names differ only by extension".to_string()
            }
            ErrorKind::UnsupportedFile => "File could not be read as an image".to_string(),
            ErrorKind::MetadataExtractionFailed => "Failed to extract metadata from images".to_string(),
            ErrorKind::WorkspaceExists => internal("failed to create temp folder"),
            ErrorKind::InvalidRequestId => internal("invalid request identifier"),
            ErrorKind::SaveFailed => internal("failed to save zipfile"),
            ErrorKind::SourceNotFound | ErrorKind::ExtractionFailed => internal("failed to unzip files"),
            ErrorKind::AssemblyFailed => internal("failed to zip files into memory"),
        };

        Failure {
            message,
            status: self.category().status(),
        }
    }
}

fn internal(detail: &str) -> String {
    format!("{INTERNAL_PREFIX}: {detail}")
}
