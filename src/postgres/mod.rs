// ABOUTME: PostgreSQL connection handling and catalog introspection
// ABOUTME: Exposes the connect helper plus table and index discovery

pub mod connection;
pub mod introspect;

pub use connection::connect;
pub use introspect::{list_tables, TableInfo};
