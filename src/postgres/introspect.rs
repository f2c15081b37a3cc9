// ABOUTME: Catalog introspection for the export source database
// ABOUTME: Renders CREATE TABLE, CREATE INDEX, and INSERT statements for export

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_postgres::{Client, SimpleQueryMessage};

use crate::export::source::{ObjectKind, SchemaObject, SchemaSource, StaticDataSet};

/// One user table, listed from the catalog or named in the static data
/// config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
}

impl TableInfo {
    /// Parse a configured table identity: `name` for the public schema or
    /// `schema.name`.
    pub fn from_config_name(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((schema, name)) => Self {
                schema: schema.to_string(),
                name: name.to_string(),
            },
            None => Self {
                schema: "public".to_string(),
                name: raw.to_string(),
            },
        }
    }

    /// Quoted, schema-qualified SQL reference.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

#[derive(Debug, Clone)]
struct ColumnInfo {
    name: String,
    data_type: String,
    not_null: bool,
    default: Option<String>,
}

/// List all user tables, ordered by schema then name so export output is
/// deterministic.
pub async fn list_tables(client: &Client) -> Result<Vec<TableInfo>> {
    let rows = client
        .query(
            "SELECT schemaname, tablename
             FROM pg_catalog.pg_tables
             WHERE schemaname NOT IN ('pg_catalog', 'information_schema')
             ORDER BY schemaname, tablename",
            &[],
        )
        .await
        .context("Failed to list tables")?;

    let tables = rows
        .iter()
        .map(|row| TableInfo {
            schema: row.get(0),
            name: row.get(1),
        })
        .collect();

    Ok(tables)
}

async fn table_columns(client: &Client, table: &TableInfo) -> Result<Vec<ColumnInfo>> {
    let rows = client
        .query(
            "SELECT a.attname,
                    pg_catalog.format_type(a.atttypid, a.atttypmod),
                    a.attnotnull,
                    pg_catalog.pg_get_expr(d.adbin, d.adrelid)
             FROM pg_catalog.pg_attribute a
             JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
             LEFT JOIN pg_catalog.pg_attrdef d
               ON d.adrelid = a.attrelid AND d.adnum = a.attnum
             WHERE n.nspname = $1
               AND c.relname = $2
               AND a.attnum > 0
               AND NOT a.attisdropped
             ORDER BY a.attnum",
            &[&table.schema, &table.name],
        )
        .await
        .with_context(|| format!("Failed to get columns for {}", table.qualified()))?;

    let columns = rows
        .iter()
        .map(|row| ColumnInfo {
            name: row.get(0),
            data_type: row.get(1),
            not_null: row.get(2),
            default: row.get(3),
        })
        .collect();

    Ok(columns)
}

async fn primary_key_columns(client: &Client, table: &TableInfo) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT a.attname
             FROM pg_catalog.pg_index i
             JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
             JOIN pg_catalog.pg_attribute a
               ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
             WHERE n.nspname = $1
               AND c.relname = $2
               AND i.indisprimary
             ORDER BY array_position(i.indkey::int2[], a.attnum)",
            &[&table.schema, &table.name],
        )
        .await
        .with_context(|| format!("Failed to get primary key for {}", table.qualified()))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Secondary indexes only: indexes backing primary key or unique
/// constraints are part of the table DDL and are skipped here.
async fn list_index_objects(client: &Client) -> Result<Vec<SchemaObject>> {
    let rows = client
        .query(
            "SELECT i.schemaname, i.indexname, i.indexdef
             FROM pg_catalog.pg_indexes i
             WHERE i.schemaname NOT IN ('pg_catalog', 'information_schema')
               AND NOT EXISTS (
                   SELECT 1
                   FROM pg_catalog.pg_constraint con
                   JOIN pg_catalog.pg_class idx ON idx.oid = con.conindid
                   JOIN pg_catalog.pg_namespace n ON n.oid = idx.relnamespace
                   WHERE n.nspname = i.schemaname
                     AND idx.relname = i.indexname
               )
             ORDER BY i.schemaname, i.indexname",
            &[],
        )
        .await
        .context("Failed to list indexes")?;

    let objects = rows
        .iter()
        .map(|row| {
            let schema: String = row.get(0);
            let name: String = row.get(1);
            let definition: String = row.get(2);
            SchemaObject {
                kind: ObjectKind::Index,
                filename: object_file_name(&schema, &name),
                statement: format!("{};", definition),
            }
        })
        .collect();

    Ok(objects)
}

async fn table_object(client: &Client, table: &TableInfo) -> Result<SchemaObject> {
    let columns = table_columns(client, table).await?;
    let primary_key = primary_key_columns(client, table).await?;

    Ok(SchemaObject {
        kind: ObjectKind::Table,
        filename: object_file_name(&table.schema, &table.name),
        statement: render_create_table(table, &columns, &primary_key),
    })
}

async fn load_schema_objects(client: &Client) -> Result<Vec<SchemaObject>> {
    let tables = list_tables(client).await?;
    tracing::debug!("Found {} table(s)", tables.len());

    let mut objects = Vec::with_capacity(tables.len());
    for table in &tables {
        objects.push(table_object(client, table).await?);
    }

    let indexes = list_index_objects(client).await?;
    tracing::debug!("Found {} secondary index(es)", indexes.len());
    objects.extend(indexes);

    Ok(objects)
}

async fn load_static_data(
    client: &Client,
    tables: &[String],
    order_by: &HashMap<String, String>,
) -> Result<Vec<StaticDataSet>> {
    let mut sets = Vec::with_capacity(tables.len());

    for raw in tables {
        let table = TableInfo::from_config_name(raw);
        let order = match order_by.get(raw) {
            Some(expr) => expr.clone(),
            None => default_order_expr(client, &table).await?,
        };

        let query = format!("SELECT * FROM {} ORDER BY {}", table.qualified(), order);
        let messages = client
            .simple_query(&query)
            .await
            .with_context(|| format!("Failed to load static data for {}", raw))?;

        let statements = rows_to_inserts(&table, &messages);
        tracing::debug!("Serialized {} row(s) from {}", statements.len(), raw);
        sets.push(StaticDataSet {
            table: raw.clone(),
            statements,
        });
    }

    Ok(sets)
}

/// Deterministic fallback ordering: the primary key columns when the table
/// has a primary key, otherwise every column in ordinal position.
async fn default_order_expr(client: &Client, table: &TableInfo) -> Result<String> {
    let mut columns = primary_key_columns(client, table).await?;
    if columns.is_empty() {
        columns = table_columns(client, table)
            .await?
            .into_iter()
            .map(|col| col.name)
            .collect();
    }
    if columns.is_empty() {
        anyhow::bail!(
            "static data table {} does not exist or has no columns",
            table.qualified()
        );
    }

    let quoted: Vec<String> = columns.iter().map(|col| quote_ident(col)).collect();
    Ok(quoted.join(", "))
}

fn rows_to_inserts(table: &TableInfo, messages: &[SimpleQueryMessage]) -> Vec<String> {
    let target = table.qualified();
    let mut statements = Vec::new();

    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            let columns: Vec<String> = row
                .columns()
                .iter()
                .map(|col| quote_ident(col.name()))
                .collect();
            let values: Vec<String> = (0..row.len())
                .map(|idx| match row.get(idx) {
                    Some(value) => quote_literal(value),
                    None => "NULL".to_string(),
                })
                .collect();

            statements.push(format!(
                "INSERT INTO {} ({}) VALUES ({});",
                target,
                columns.join(", "),
                values.join(", ")
            ));
        }
    }

    statements
}

fn render_create_table(
    table: &TableInfo,
    columns: &[ColumnInfo],
    primary_key: &[String],
) -> String {
    let mut entries: Vec<String> = columns
        .iter()
        .map(|col| {
            let mut line = format!("    {} {}", quote_ident(&col.name), col.data_type);
            if let Some(default) = &col.default {
                line.push_str(" DEFAULT ");
                line.push_str(default);
            }
            if col.not_null {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();

    if !primary_key.is_empty() {
        let quoted: Vec<String> = primary_key.iter().map(|col| quote_ident(col)).collect();
        entries.push(format!("    PRIMARY KEY ({})", quoted.join(", ")));
    }

    if entries.is_empty() {
        return format!("CREATE TABLE {} ();", table.qualified());
    }

    format!(
        "CREATE TABLE {} (\n{}\n);",
        table.qualified(),
        entries.join(",\n")
    )
}

/// Values are rendered as quoted literals regardless of column type;
/// Postgres coerces untyped literals back to the column type on re-import.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn object_file_name(schema: &str, name: &str) -> String {
    if schema == "public" {
        format!("{}.sql", name)
    } else {
        format!("{}.{}.sql", schema, name)
    }
}

fn join_statements(objects: &[SchemaObject]) -> String {
    let mut blob = objects
        .iter()
        .map(|object| object.statement.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !blob.is_empty() {
        blob.push('\n');
    }
    blob
}

#[async_trait]
impl SchemaSource for Client {
    async fn schema_blob(&self) -> Result<String> {
        let objects = load_schema_objects(self).await?;
        Ok(join_statements(&objects))
    }

    async fn schema_objects(&self) -> Result<Vec<SchemaObject>> {
        load_schema_objects(self).await
    }

    async fn static_data(
        &self,
        tables: &[String],
        order_by: &HashMap<String, String>,
    ) -> Result<Vec<StaticDataSet>> {
        load_static_data(self, tables, order_by).await
    }
}
