use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Replace the content of `path` through a sibling temp file and a rename.
///
/// Readers observe either the old or the new content, never a partial write.
/// When `path` already exists its permission bits carry over to the new file.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let tmp = staged(path, content)?;

    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), metadata.permissions())
            .map_err(|source| write_error(path, source))?;
    }

    tmp.persist(path).map_err(|e| write_error(path, e.error))?;
    Ok(())
}

/// Like [`atomic_write`], but fails with [`Error::AlreadyExists`] instead of
/// replacing an existing file.
pub fn atomic_create(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let tmp = staged(path, content)?;

    tmp.persist_noclobber(path).map_err(|e| match e.error.kind() {
        io::ErrorKind::AlreadyExists => Error::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => write_error(path, e.error),
    })?;
    Ok(())
}

fn staged(path: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| write_error(path, source))?;
    tmp.write_all(content)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|source| write_error(path, source))?;
    Ok(tmp)
}

fn write_error(path: &Path, source: io::Error) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source,
    }
}
