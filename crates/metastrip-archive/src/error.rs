use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive of {size} bytes exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("extracted content of {size} bytes exceeds the extraction budget of {limit} bytes")]
    ExtractionBudgetExceeded { size: u64, limit: u64 },

    #[error("archive member '{name}' is not an allowed image file")]
    DisallowedMember { name: String },

    #[error("archive is corrupted")]
    CorruptArchive,

    #[error("archive contains no entries")]
    EmptyArchive,

    #[error("archive entry '{raw}' has no usable name after sanitization")]
    InvalidEntryName { raw: String },

    #[error("more than one archive entry sanitizes to '{name}'")]
    DuplicateEntry { name: String },

    #[error("archive not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("'{path}' has no known content type")]
    IllegalFile { path: PathBuf },

    #[error("failed to assemble archive from '{path}': {reason}")]
    AssemblyFailed { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
