// ABOUTME: Artifact writing for schema objects and static data
// ABOUTME: Creates category directories on demand and overwrites files verbatim

use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::export::layout::ExportLayout;
use crate::export::source::{SchemaObject, StaticDataSet};

// Modes apply on creation only and are subject to the process umask, like
// the rest of the ecosystem's file writes. Non-Unix builds take platform
// defaults.
const SCHEMA_FILE_MODE: u32 = 0o664;
const STATIC_DATA_FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o700;

/// Write one schema object into its category directory, creating the
/// directory on demand and overwriting any previous file of the same name.
/// The statement is written verbatim.
pub fn write_schema_object(layout: &ExportLayout, object: &SchemaObject) -> Result<()> {
    ensure_dir(&layout.category_dir(object.kind))?;
    let path = layout.schema_object_path(object);
    write_file(&path, &object.statement, SCHEMA_FILE_MODE)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write one static data set under `static_data/`, one file per table,
/// statements joined with newlines. Overwrite semantics match
/// [`write_schema_object`].
pub fn write_static_data(layout: &ExportLayout, set: &StaticDataSet) -> Result<()> {
    ensure_dir(&layout.static_data_dir())?;
    let path = layout.static_data_path(set);
    write_file(&path, &set.statements.join("\n"), STATIC_DATA_FILE_MODE)?;
    tracing::debug!("Wrote {} ({} statement(s))", path.display(), set.statements.len());
    Ok(())
}

/// Overwrite the consolidated schema file. No directory reconciliation and
/// no parent creation: consolidated mode targets an existing location.
pub fn write_consolidated_schema(path: &Path, ddl: &str) -> Result<()> {
    write_file(path, ddl, SCHEMA_FILE_MODE)
}

fn ensure_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(path)
        .with_context(|| format!("failed to create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}
