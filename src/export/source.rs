// ABOUTME: Export data model and the schema source seam
// ABOUTME: Defines SchemaObject, StaticDataSet, and the SchemaSource trait

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

/// Category of an exported schema object. Determines which subdirectory of
/// the export tree the object lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Index,
}

impl ObjectKind {
    /// Fixed directory name for this category under the export root.
    pub fn dir_name(self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::Index => "index",
        }
    }
}

/// One exported DDL-bearing entity, ready to land on disk.
///
/// Produced by a [`SchemaSource`]; the statement is written verbatim, so the
/// source decides formatting and termination.
#[derive(Debug, Clone)]
pub struct SchemaObject {
    pub kind: ObjectKind,
    /// Target filename, unique within the object's category.
    pub filename: String,
    /// Literal file content.
    pub statement: String,
}

/// Exported row content of one static data table.
#[derive(Debug, Clone)]
pub struct StaticDataSet {
    /// Table identity as configured, used to derive the filename.
    pub table: String,
    /// One serialized row statement each, already in export order.
    pub statements: Vec<String>,
}

impl StaticDataSet {
    /// Filename for this data set. Stable across runs for the same table
    /// identity, and unique because table identities are unique.
    pub fn file_name(&self) -> String {
        format!("{}.sql", self.table)
    }
}

/// Read side of an export: everything the pipeline needs from a live
/// database. The production implementation lives in
/// [`crate::postgres::introspect`]; tests substitute in-memory fakes.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// The full schema as one consolidated DDL document.
    async fn schema_blob(&self) -> Result<String>;

    /// One entry per DDL-bearing object, tables before their indexes.
    async fn schema_objects(&self) -> Result<Vec<SchemaObject>>;

    /// Serialized row data for the named tables, in the given order,
    /// honoring any per-table custom ordering expression.
    async fn static_data(
        &self,
        tables: &[String],
        order_by: &HashMap<String, String>,
    ) -> Result<Vec<StaticDataSet>>;
}
