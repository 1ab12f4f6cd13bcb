use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Suffix appended to an image's stem to name its sidecar.
pub const SIDECAR_SUFFIX: &str = "_meta.json";

/// A single EXIF tag value as written to the sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Int(i64),
    Text(String),
}

/// Metadata captured from one image before its EXIF payload was removed.
///
/// Serializes to the sidecar layout: `format`, `mode`, `size` and, only when
/// the image carried readable EXIF, `exif`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadataRecord {
    #[serde(skip)]
    source: PathBuf,
    format: String,
    mode: String,
    size: [u32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exif: Option<BTreeMap<String, TagValue>>,
}

impl ImageMetadataRecord {
    pub(crate) fn new(
        source: &Path,
        format: String,
        mode: String,
        size: [u32; 2],
        exif: Option<BTreeMap<String, TagValue>>,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            format,
            mode,
            size,
            exif,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// `[width, height]` in pixels.
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn exif(&self) -> Option<&BTreeMap<String, TagValue>> {
        self.exif.as_ref()
    }

    pub fn tag(&self, name: &str) -> Option<&TagValue> {
        self.exif.as_ref()?.get(name)
    }

    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path_for(&self.source)
    }

    /// Render the sidecar document, indented by four spaces.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }
}

/// `<dir>/<stem>_meta.json` for an image at `<dir>/<stem>.<ext>`.
pub fn sidecar_path_for(image: &Path) -> PathBuf {
    let stem = image.file_stem().unwrap_or(image.as_os_str());
    let mut name = stem.to_os_string();
    name.push(SIDECAR_SUFFIX);
    image.with_file_name(name)
}
