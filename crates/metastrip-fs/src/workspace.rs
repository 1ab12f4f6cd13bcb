use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Name of the directory inside a workspace that holds extracted images.
pub const IMAGES_DIR: &str = "images";

/// An isolated per-request directory tree.
///
/// The tree is owned by exactly one value. [`Workspace::destroy`] consumes it,
/// and dropping a workspace that was never destroyed removes the tree too, so
/// teardown happens on every exit path.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    base: PathBuf,
    images: PathBuf,
    destroyed: bool,
}

impl Workspace {
    /// Create `<root>/<id>` and `<root>/<id>/images`.
    ///
    /// Neither directory may exist beforehand. The base directory is created
    /// non-recursively, so two callers racing on the same id cannot both win.
    pub fn create(root: impl AsRef<Path>, id: &str) -> Result<Self> {
        validate_id(id)?;

        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|source| Error::Create {
            path: root.to_path_buf(),
            source,
        })?;

        let base = root.join(id);
        create_exclusive(&base)?;

        // From here on the base directory is ours; an early return drops
        // `workspace` and removes the partial tree.
        let workspace = Self {
            id: id.to_string(),
            images: base.join(IMAGES_DIR),
            base,
            destroyed: false,
        };
        create_exclusive(&workspace.images)?;

        tracing::debug!(path = %workspace.base.display(), "workspace created");
        Ok(workspace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn images(&self) -> &Path {
        &self.images
    }

    /// Recursively remove the workspace tree.
    pub fn destroy(mut self) -> Result<()> {
        self.destroyed = true;
        remove_tree(&self.base)?;
        tracing::debug!(path = %self.base.display(), "workspace destroyed");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.destroyed {
            if let Err(e) = remove_tree(&self.base) {
                tracing::warn!(error = %e, "failed to remove abandoned workspace");
            }
        }
    }
}

fn validate_id(id: &str) -> Result<()> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == id => Ok(()),
        _ => Err(Error::InvalidId(id.to_string())),
    }
}

fn create_exclusive(path: &Path) -> Result<()> {
    std::fs::create_dir(path).map_err(|source| match source.kind() {
        io::ErrorKind::AlreadyExists => Error::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => Error::Create {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn remove_tree(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
