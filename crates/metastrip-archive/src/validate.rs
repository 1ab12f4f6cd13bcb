use std::io::Cursor;

use crate::entry::IntakeReport;
use crate::error::{Error, Result};
use crate::options::IntakePolicy;

/// Inspect an uploaded archive held in memory.
///
/// Checks the size limit first, then reads the central directory and
/// rejects any member whose extension is not allowed. Nothing is
/// decompressed and nothing is written to disk.
pub fn validate_upload(bytes: &[u8], policy: &IntakePolicy) -> Result<IntakeReport> {
    let size = bytes.len() as u64;
    if size > policy.size_limit {
        return Err(Error::SizeLimitExceeded {
            size,
            limit: policy.size_limit,
        });
    }

    let archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        tracing::debug!(error = %e, "upload is not a readable zip");
        Error::CorruptArchive
    })?;

    if let Some(name) = archive
        .file_names()
        .find(|name| !policy.allowed_extensions.allows(name))
    {
        tracing::debug!(
            member = %name,
            allowed = ?policy.allowed_extensions.iter().collect::<Vec<_>>(),
            "rejecting upload"
        );
        return Err(Error::DisallowedMember {
            name: name.to_string(),
        });
    }

    Ok(IntakeReport {
        member_count: archive.len(),
        archive_bytes: size,
    })
}
