use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use metastrip_fs::normalize_permissions;

use crate::entry::{ArchiveEntry, ExtractReport};
use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::sanitize::SanitizedName;

const COPY_BUFFER: usize = 64 * 1024;

/// Extract every file of the zip at `archive_path` into `destination`.
///
/// Entries are written under their sanitized names only; the raw names never
/// reach the filesystem. Directory entries are skipped, so the result is a
/// flat set of files. Existing content of `destination` is left in place.
pub fn extract_archive(
    archive_path: &Path,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let file = File::open(archive_path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::SourceNotFound {
            path: archive_path.to_path_buf(),
        },
        _ => Error::ExtractionFailed {
            path: archive_path.to_path_buf(),
            source,
        },
    })?;

    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| zip_error(e, archive_path))?;
    if archive.len() == 0 {
        return Err(Error::EmptyArchive);
    }

    let mut seen = HashSet::new();
    let mut report = ExtractReport::default();

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| zip_error(e, archive_path))?;
        if file.is_dir() {
            tracing::debug!(name = file.name(), "skipping directory entry");
            continue;
        }

        let raw_name = file.name().to_string();
        let name = SanitizedName::new(&raw_name).ok_or_else(|| Error::InvalidEntryName {
            raw: raw_name.clone(),
        })?;
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateEntry {
                name: name.to_string(),
            });
        }

        let allowance = options
            .max_entry_bytes
            .min(options.max_total_bytes.saturating_sub(report.total_bytes));
        let declared = file.size();
        if declared > allowance {
            return Err(budget_error(declared, report.total_bytes, options));
        }

        let target = destination.join(&name);
        let written = write_entry(&mut file, &target, allowance)
            .map_err(|e| match e {
                Error::ExtractionBudgetExceeded { size, .. } => {
                    budget_error(size, report.total_bytes, options)
                }
                other => other,
            })?;
        normalize_permissions(&target).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: io::Error::other(e),
        })?;

        let entry = ArchiveEntry::new(raw_name, name, written);
        tracing::debug!(
            raw = %entry.raw_name,
            name = %entry.sanitized_name,
            bytes = written,
            renamed = entry.was_renamed(),
            "extracted entry"
        );
        report.total_bytes += written;
        report.entries.push(entry);
    }

    if report.entries.is_empty() {
        return Err(Error::EmptyArchive);
    }
    Ok(report)
}

/// Copy at most `allowance` bytes of `reader` into a new file at `target`.
///
/// Read failures come from the archive and are reported as corruption;
/// write failures are extraction failures. An entry that inflates past its
/// allowance is removed again.
fn write_entry(reader: &mut impl Read, target: &Path, allowance: u64) -> Result<u64> {
    let write_err = |source| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source,
    };

    let mut out = File::create(target).map_err(write_err)?;
    let mut buffer = vec![0u8; COPY_BUFFER];
    let mut written = 0u64;

    loop {
        let n = reader.read(&mut buffer).map_err(|e| {
            tracing::debug!(error = %e, path = %target.display(), "entry data unreadable");
            Error::CorruptArchive
        });
        let n = match n {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                drop(out);
                let _ = std::fs::remove_file(target);
                return Err(e);
            }
        };

        written += n as u64;
        if written > allowance {
            drop(out);
            let _ = std::fs::remove_file(target);
            return Err(Error::ExtractionBudgetExceeded {
                size: written,
                limit: allowance,
            });
        }
        out.write_all(&buffer[..n]).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    Ok(written)
}

fn budget_error(entry_bytes: u64, extracted_so_far: u64, options: &ExtractOptions) -> Error {
    if entry_bytes > options.max_entry_bytes {
        Error::ExtractionBudgetExceeded {
            size: entry_bytes,
            limit: options.max_entry_bytes,
        }
    } else {
        Error::ExtractionBudgetExceeded {
            size: extracted_so_far.saturating_add(entry_bytes),
            limit: options.max_total_bytes,
        }
    }
}

fn zip_error(err: zip::result::ZipError, archive_path: &Path) -> Error {
    match err {
        zip::result::ZipError::Io(source) => Error::ExtractionFailed {
            path: archive_path.to_path_buf(),
            source,
        },
        other => {
            tracing::debug!(error = %other, path = %archive_path.display(), "unreadable zip structure");
            Error::CorruptArchive
        }
    }
}
