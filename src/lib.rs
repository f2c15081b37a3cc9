// ABOUTME: Library module for postgres-schema-exporter
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod export;
pub mod postgres;
