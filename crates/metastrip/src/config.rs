use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use metastrip_archive::options::{
    DEFAULT_MAX_ENTRY_BYTES, DEFAULT_MAX_TOTAL_BYTES, DEFAULT_SIZE_LIMIT,
};
use metastrip_archive::{ExtensionSet, ExtractOptions, IntakePolicy};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "METASTRIP_";

#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[source] Box<figment::Error>);

/// Settings for a [`Pipeline`](crate::Pipeline). Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest accepted upload, in bytes.
    pub size_limit: u64,
    pub allowed_extensions: Vec<String>,
    /// Directory under which per-request workspaces are created.
    pub workspace_root: PathBuf,
    /// File name offered to the caller for the result archive.
    pub output_name: String,
    /// File name of the saved upload inside a workspace.
    pub upload_name: String,
    pub max_extracted_bytes: u64,
    pub max_entry_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            allowed_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            workspace_root: PathBuf::from("temp"),
            output_name: "images.zip".into(),
            upload_name: "upload.zip".into(),
            max_extracted_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

impl PipelineConfig {
    /// Defaults, overlaid by the TOML file at `path` (if it exists), overlaid
    /// by `METASTRIP_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError(Box::new(e)))
    }

    pub fn intake_policy(&self) -> IntakePolicy {
        IntakePolicy::default()
            .size_limit(self.size_limit)
            .allowed_extensions(ExtensionSet::new(&self.allowed_extensions))
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::default()
            .max_total_bytes(self.max_extracted_bytes)
            .max_entry_bytes(self.max_entry_bytes)
    }
}
