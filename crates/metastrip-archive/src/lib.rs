//! Upload archive handling: intake validation, sanitized extraction and
//! result archive assembly.
//!
//! # Architecture
//!
//! - `classify.rs` - Extension to content-type mapping and the extension allow-list
//! - `sanitize.rs` - Entry-name sanitization (zip-slip prevention)
//! - `validate.rs` - In-memory intake checks, before anything touches disk
//! - `extract.rs` - Zip extraction under sanitized names with a decompression budget
//! - `assemble.rs` - In-memory result archive with content-type labels

pub use assemble::{CONTENT_TYPE_FIELD, assemble_archive};
pub use classify::{ContentType, ExtensionSet};
pub use entry::{ArchiveEntry, ExtractReport, IntakeReport};
pub use error::{Error, Result};
pub use extract::extract_archive;
pub use options::{ExtractOptions, IntakePolicy};
pub use sanitize::{SanitizedName, sanitize_filename};
pub use validate::validate_upload;

pub mod classify;
pub mod entry;
pub mod options;
mod assemble;
mod error;
mod extract;
mod sanitize;
mod validate;
