use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{path}' could not be read as an image: {reason}")]
    UnsupportedFile { path: PathBuf, reason: String },

    #[error("failed to extract metadata from '{path}': {reason}")]
    MetadataExtractionFailed { path: PathBuf, reason: String },

    #[error("metadata sidecar already exists: {path}")]
    SidecarExists { path: PathBuf },
}

impl Error {
    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MetadataExtractionFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unsupported(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnsupportedFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
