//! Upload pipeline: takes a zip of images, removes their EXIF metadata and
//! returns a zip holding the cleaned images plus one JSON sidecar each.
//!
//! # Architecture
//!
//! - `pipeline.rs` - Stage machine, workspace lifecycle and observer hook
//! - `request.rs` - Request identity and the upload handed over by transport
//! - `config.rs` - Layered configuration (defaults, TOML file, environment)
//! - `error.rs` - Failure taxonomy and caller-visible messages
//!
//! The filesystem, archive and image work lives in `metastrip-fs`,
//! `metastrip-archive` and `metastrip-image`.

pub use config::{ConfigError, ENV_PREFIX, PipelineConfig};
pub use error::{Category, ErrorKind, Failure, PipelineError};
pub use pipeline::{NoopObserver, Pipeline, PipelineObserver, ProcessedUpload, Stage};
pub use request::{
    REQUEST_ID_HEADER, RequestId, UploadRequest, ZIP_CONTENT_TYPE, is_zip_content_type,
};

mod config;
mod error;
mod pipeline;
mod request;
