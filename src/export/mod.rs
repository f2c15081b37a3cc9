// ABOUTME: Export pipeline building blocks
// ABOUTME: Config resolution, target tree layout, data model, and artifact writing

pub mod config;
pub mod layout;
pub mod source;
pub mod writer;

pub use config::{resolve_static_data_config, StaticDataConfig};
pub use layout::ExportLayout;
pub use source::{ObjectKind, SchemaObject, SchemaSource, StaticDataSet};
pub use writer::{write_consolidated_schema, write_schema_object, write_static_data};
