//! Entry-name sanitization (zip-slip prevention).
//!
//! Archive entry names are untrusted. Rather than resolving and checking
//! paths, every name is flattened into a single file-name component built
//! only from an explicit allow-list of characters.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w.!@#$%\^()\[\]\-]").unwrap());
static DOT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Rewrite an untrusted entry name into a safe file name.
///
/// Removes every character outside word characters and `.!@#$%^()[]-`,
/// collapses runs of `.` and of `_`, then trims `_` and `.` from both ends.
/// Path separators are among the removed characters, so the result is a
/// single component and never starts with `..`. The result may be empty.
pub fn sanitize_filename(raw: &str) -> String {
    let kept = DISALLOWED_CHARS.replace_all(raw, "");
    let dots = DOT_RUNS.replace_all(&kept, ".");
    let underscores = UNDERSCORE_RUNS.replace_all(&dots, "_");
    let sanitized = underscores.trim_matches(|c| c == '_' || c == '.').to_string();

    tracing::debug!(raw, sanitized = %sanitized, "sanitized entry name");
    sanitized
}

/// A sanitized, non-empty file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SanitizedName(String);

impl SanitizedName {
    /// Sanitize `raw`, returning `None` when nothing usable remains.
    pub fn new(raw: &str) -> Option<Self> {
        let name = sanitize_filename(raw);
        (!name.is_empty()).then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for SanitizedName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl fmt::Display for SanitizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
