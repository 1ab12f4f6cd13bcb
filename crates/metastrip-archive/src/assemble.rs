use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Component, Path};

use walkdir::WalkDir;
use zip::write::FullFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::classify::ContentType;
use crate::error::{Error, Result};

/// Zip extra-field header id carrying an entry's content-type label.
///
/// The payload is the UTF-8 mime string, e.g. `image/jpeg`.
pub const CONTENT_TYPE_FIELD: u16 = 0x6D74;

/// Build an in-memory zip of every file below `source_dir`.
///
/// Entries are named by their `/`-separated path relative to `source_dir`
/// and tagged with their content type. Any file without a known content
/// type aborts assembly.
pub fn assemble_archive(source_dir: &Path) -> Result<Vec<u8>> {
    if !source_dir.is_dir() {
        return Err(assembly_error(source_dir, "directory does not exist"));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut count = 0usize;
    let mut images = 0usize;

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source_dir).to_path_buf();
            assembly_error(&path, e)
        })?;
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let content_type = match ContentType::for_path(path) {
            Some(ct) if entry.file_type().is_file() => ct,
            _ => {
                return Err(Error::IllegalFile {
                    path: path.to_path_buf(),
                });
            }
        };

        let name = entry_name(path, source_dir)?;
        let mut options =
            FullFileOptions::default().compression_method(CompressionMethod::Deflated);
        options
            .add_extra_data(
                CONTENT_TYPE_FIELD,
                content_type.mime().as_bytes().to_vec().into_boxed_slice(),
                false,
            )
            .map_err(|e| assembly_error(path, e))?;

        tracing::debug!(entry = %name, mime = content_type.mime(), "adding entry");
        writer
            .start_file(name, options)
            .map_err(|e| assembly_error(path, e))?;
        let mut file = File::open(path).map_err(|e| assembly_error(path, e))?;
        io::copy(&mut file, &mut writer).map_err(|e| assembly_error(path, e))?;
        count += 1;
        if content_type.is_image() {
            images += 1;
        }
    }

    let buffer = writer
        .finish()
        .map_err(|e| assembly_error(source_dir, e))?
        .into_inner();
    tracing::debug!(entries = count, images, bytes = buffer.len(), "archive assembled");
    Ok(buffer)
}

fn entry_name(path: &Path, source_dir: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(source_dir)
        .map_err(|e| assembly_error(path, e))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| assembly_error(path, "file name is not valid UTF-8"))?,
            ),
            _ => return Err(assembly_error(path, "unexpected path component")),
        }
    }
    Ok(parts.join("/"))
}

fn assembly_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::AssemblyFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
