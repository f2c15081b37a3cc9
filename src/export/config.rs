// ABOUTME: Static data configuration resolution
// ABOUTME: Reads the JSON or plain-text tables file with a defined precedence

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

/// Canonical plain-text config filename, one table name per line.
pub const DEFAULT_TABLES_FILENAME: &str = "static_data_tables.txt";

/// Structured config filename tried first when the path hint uses the
/// canonical default name.
pub const JSON_CONFIG_FILENAME: &str = "schema-export.json";

/// Resolved static data export configuration.
///
/// `static_data_tables` order determines export order. `custom_order_by`
/// maps a table name to the ORDER BY expression used when serializing its
/// rows; tables without an entry get a deterministic default ordering.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StaticDataConfig {
    pub static_data_tables: Vec<String>,
    pub custom_order_by: HashMap<String, String>,
}

impl StaticDataConfig {
    pub fn is_empty(&self) -> bool {
        self.static_data_tables.is_empty()
    }
}

/// One config file probe in the resolution chain.
#[derive(Debug)]
enum Candidate {
    Json(PathBuf),
    Text(PathBuf),
}

/// Outcome of probing a single candidate.
enum Resolution {
    Found(StaticDataConfig),
    Absent,
    Malformed(anyhow::Error),
}

/// Resolve the static data configuration for a path hint.
///
/// A hint named [`DEFAULT_TABLES_FILENAME`] first tries the
/// [`JSON_CONFIG_FILENAME`] sibling, then the text file itself. An explicit
/// `.json` or `.txt` path reads only that format. Absent files are not
/// errors: the chain moves on, and an exhausted chain yields an empty
/// config. A malformed candidate is skipped while later candidates can
/// still supply a config, but its error resurfaces if none does: a broken
/// config file never silently disables static data export.
pub fn resolve_static_data_config(path: &Path) -> Result<StaticDataConfig> {
    let mut first_malformed = None;

    for candidate in candidates_for(path) {
        match candidate.probe() {
            Resolution::Found(config) => {
                tracing::debug!(
                    "Resolved {} static data table(s) from {:?}",
                    config.static_data_tables.len(),
                    candidate
                );
                return Ok(config);
            }
            Resolution::Absent => continue,
            Resolution::Malformed(err) => {
                if first_malformed.is_none() {
                    first_malformed = Some(err);
                }
            }
        }
    }

    match first_malformed {
        Some(err) => Err(err),
        None => Ok(StaticDataConfig::default()),
    }
}

/// Build the ordered candidate list for a path hint.
fn candidates_for(path: &Path) -> Vec<Candidate> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if name == DEFAULT_TABLES_FILENAME {
        vec![
            Candidate::Json(path.with_file_name(JSON_CONFIG_FILENAME)),
            Candidate::Text(path.to_path_buf()),
        ]
    } else if name.ends_with(".json") {
        vec![Candidate::Json(path.to_path_buf())]
    } else if name.ends_with(".txt") {
        vec![Candidate::Text(path.to_path_buf())]
    } else {
        Vec::new()
    }
}

impl Candidate {
    fn probe(&self) -> Resolution {
        match self {
            Candidate::Json(path) => match read_config_file(path) {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(config) => Resolution::Found(config),
                    Err(err) => Resolution::Malformed(anyhow::Error::new(err).context(format!(
                        "malformed static data config {}",
                        path.display()
                    ))),
                },
                Ok(None) => Resolution::Absent,
                Err(err) => Resolution::Malformed(err),
            },
            Candidate::Text(path) => match read_config_file(path) {
                Ok(Some(raw)) => Resolution::Found(StaticDataConfig {
                    static_data_tables: parse_table_lines(&raw),
                    custom_order_by: HashMap::new(),
                }),
                Ok(None) => Resolution::Absent,
                Err(err) => Resolution::Malformed(err),
            },
        }
    }
}

/// Read a config file, distinguishing "not there" from "unreadable".
fn read_config_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err)
            .context(format!("failed to read static data config {}", path.display()))),
    }
}

/// Each non-empty line is one table name, file order preserved.
fn parse_table_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
