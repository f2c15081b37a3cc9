// ABOUTME: Command implementations for each export mode
// ABOUTME: Exports the consolidated and discrete schema export commands

pub mod export;
pub mod export_discrete;

pub use export::export;
pub use export_discrete::export_discrete;
