use std::fmt;

use uuid::Uuid;

use crate::error::PipelineError;

/// Header in which the transport layer echoes the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// The only content type accepted for uploads and produced for results.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Identifier of one upload; also the name of its workspace directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub const MAX_LEN: usize = 128;

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied id made of `[A-Za-z0-9_-]`, at most
    /// [`Self::MAX_LEN`] bytes.
    pub fn parse(id: &str) -> Result<Self, PipelineError> {
        let valid = !id.is_empty()
            && id.len() <= Self::MAX_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(PipelineError::InvalidRequestId(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One upload as handed over by the transport layer.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub id: RequestId,
    /// Authenticated caller identity, used for logging only.
    pub caller: String,
    /// Declared content type of the uploaded file.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    /// A request with a freshly generated id.
    pub fn new(caller: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: RequestId::generate(),
            caller: caller.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }
}

/// Whether a declared content type names a zip archive.
///
/// Parameters after `;` are ignored and the comparison is case-insensitive.
pub fn is_zip_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(ZIP_CONTENT_TYPE))
}
