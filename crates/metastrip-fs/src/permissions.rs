use std::path::Path;

use crate::Result;

/// Mode bits every extracted file must carry: owner read/write, group and
/// others read.
pub const FILE_MODE: u32 = 0o644;

/// Add [`FILE_MODE`] to the permissions of `path`, keeping any other bits.
///
/// A no-op on platforms without Unix permission bits.
#[cfg(unix)]
pub fn normalize_permissions(path: impl AsRef<Path>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    use crate::Error;

    let path = path.as_ref();
    let perm_err = |source| Error::Permissions {
        path: path.to_path_buf(),
        source,
    };

    let current = std::fs::metadata(path).map_err(perm_err)?.permissions().mode();
    let wanted = current | FILE_MODE;
    if wanted != current {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(wanted))
            .map_err(perm_err)?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn normalize_permissions(_path: impl AsRef<Path>) -> Result<()> {
    Ok(())
}
