use crate::catalog::Category;
use crate::error::SetupError;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output tree of a run: a root with one direct subdirectory per category.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    root: PathBuf,
    category_dirs: BTreeMap<Category, PathBuf>,
}

impl DirectoryLayout {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> Option<&Path> {
        self.category_dirs.get(&category).map(PathBuf::as_path)
    }
}

/// Ensure `root` and one subdirectory per category exist.
///
/// Existing directories are left alone. A path that exists but is not a
/// directory is fatal, as is any other I/O failure while creating.
pub fn ensure_layout(root: &Path, categories: &[Category]) -> Result<DirectoryLayout, SetupError> {
    ensure_dir(root)?;

    let category_dirs: BTreeMap<Category, PathBuf> = categories
        .iter()
        .map(|category| (*category, root.join(category.dir_name())))
        .collect();

    category_dirs
        .par_iter()
        .try_for_each(|(_, dir)| ensure_dir(dir))?;

    info!(root = %root.display(), "All required directories are ready");
    Ok(DirectoryLayout {
        root: root.to_path_buf(),
        category_dirs,
    })
}

fn ensure_dir(dir: &Path) -> Result<(), SetupError> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(SetupError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    fs::create_dir_all(dir).map_err(|source| SetupError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!(dir = %dir.display(), "Created directory");
    Ok(())
}
