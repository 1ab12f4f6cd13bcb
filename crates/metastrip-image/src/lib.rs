//! Image metadata capture and EXIF removal.
//!
//! Each processed image gets a `<stem>_meta.json` sidecar holding its format,
//! colour mode, dimensions and EXIF tags, and loses its EXIF payload in place.
//!
//! # Architecture
//!
//! - `process.rs` - Per-image and per-directory entry points
//! - `record.rs` - Sidecar record and its JSON layout
//! - `tags.rs` - EXIF tag reading and value coercion
//! - `strip.rs` - JPEG segment / PNG chunk filtering, re-encode fallback

pub use error::{Error, Result};
pub use process::{process_directory, process_image};
pub use record::{ImageMetadataRecord, SIDECAR_SUFFIX, TagValue, sidecar_path_for};

mod error;
mod process;
mod record;
mod strip;
mod tags;
