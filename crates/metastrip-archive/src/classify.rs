use std::collections::BTreeSet;
use std::path::Path;

/// Content categories that may appear in a result archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    Jpeg,
    Png,
    Json,
}

impl ContentType {
    /// Classify a bare extension (no leading dot). Matching is exact, so
    /// `JPG` has no type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Classify by the final extension of `path`.
    ///
    /// Dot-files such as `.jpg` have no extension and therefore no type.
    pub fn for_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Json => "application/json",
        }
    }

    pub fn is_image(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// Allow-list of image extensions accepted at intake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionSet(BTreeSet<String>);

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
        )
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, ext: &str) -> bool {
        self.0.contains(ext)
    }

    /// Whether the final extension of `name` is in the set.
    pub fn allows(&self, name: impl AsRef<Path>) -> bool {
        name.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.contains(ext))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(["jpg", "jpeg", "png"])
    }
}
