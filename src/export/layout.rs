// ABOUTME: Target directory tree for discrete exports
// ABOUTME: Owns category paths and clears stale artifacts before a run

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::export::source::{ObjectKind, SchemaObject, StaticDataSet};

/// Directory name for exported static data under the export root.
pub const STATIC_DATA_DIR: &str = "static_data";

/// The export target tree: a root directory partitioned into the fixed
/// `table/`, `index/`, and `static_data/` categories. Anything else under
/// the root is never touched.
#[derive(Debug, Clone)]
pub struct ExportLayout {
    root: PathBuf,
}

impl ExportLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, kind: ObjectKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn static_data_dir(&self) -> PathBuf {
        self.root.join(STATIC_DATA_DIR)
    }

    pub fn schema_object_path(&self, object: &SchemaObject) -> PathBuf {
        self.category_dir(object.kind).join(&object.filename)
    }

    pub fn static_data_path(&self, set: &StaticDataSet) -> PathBuf {
        self.static_data_dir().join(set.file_name())
    }

    /// Remove the three category subtrees so a fresh export cannot leave
    /// artifacts of objects that no longer exist. Missing subtrees are a
    /// no-op; runs once, before any artifact of the current run is written.
    pub fn clear(&self) -> Result<()> {
        remove_tree(&self.category_dir(ObjectKind::Table))?;
        remove_tree(&self.category_dir(ObjectKind::Index))?;
        remove_tree(&self.static_data_dir())?;
        Ok(())
    }
}

fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!("Cleared {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to clear directory {}", path.display()))
        }
    }
}
