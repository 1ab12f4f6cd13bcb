//! Filesystem primitives for the upload pipeline.
//!
//! # Architecture
//!
//! - `workspace.rs` - Per-request scratch directory with guaranteed teardown
//! - `atomic.rs` - Whole-file writes via temp file + rename (replace or create-new)
//! - `permissions.rs` - Mode normalization for extracted files

pub use atomic::{atomic_create, atomic_write};
pub use error::{Error, Result};
pub use permissions::{FILE_MODE, normalize_permissions};
pub use workspace::{IMAGES_DIR, Workspace};

mod atomic;
mod error;
mod permissions;
mod workspace;
