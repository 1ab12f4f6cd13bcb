use std::path::{Path, PathBuf};

use crate::sanitize::SanitizedName;

/// One file written during extraction.
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    /// Name as stored in the uploaded archive. Untrusted.
    pub raw_name: String,
    pub sanitized_name: SanitizedName,
    pub size: u64,
}

impl ArchiveEntry {
    pub fn new(raw_name: impl Into<String>, sanitized_name: SanitizedName, size: u64) -> Self {
        Self {
            raw_name: raw_name.into(),
            sanitized_name,
            size,
        }
    }

    /// Location of the extracted file under `destination`.
    pub fn target_path(&self, destination: &Path) -> PathBuf {
        destination.join(&self.sanitized_name)
    }

    pub fn was_renamed(&self) -> bool {
        self.raw_name != self.sanitized_name.as_str()
    }
}

/// Outcome of a successful extraction.
#[derive(Clone, Debug, Default)]
pub struct ExtractReport {
    pub entries: Vec<ArchiveEntry>,
    pub total_bytes: u64,
}

impl ExtractReport {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Outcome of a successful intake validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakeReport {
    pub member_count: usize,
    pub archive_bytes: u64,
}
