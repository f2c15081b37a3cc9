// ABOUTME: CLI entry point for postgres-schema-exporter
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use postgres_schema_exporter::commands;

#[derive(Parser)]
#[command(name = "postgres-schema-exporter")]
#[command(about = "Export PostgreSQL schema and static data to version-controllable files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the full schema into a single consolidated file
    Export {
        #[arg(long)]
        source: String,
        /// Export directory receiving the default schema.sql
        #[arg(long, default_value = ".")]
        directory: String,
        /// Explicit output path, overriding --directory
        #[arg(long)]
        schema_file: Option<String>,
    },
    /// Export one file per table, index, and static data table
    ExportDiscrete {
        #[arg(long)]
        source: String,
        /// Export directory receiving the table/, index/, and static_data/ trees
        #[arg(long, default_value = ".")]
        directory: String,
        /// Path to the static data config (defaults to <directory>/static_data_tables.txt)
        #[arg(long)]
        static_data_tables_file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            source,
            directory,
            schema_file,
        } => commands::export(&source, &directory, schema_file.as_deref()).await,
        Commands::ExportDiscrete {
            source,
            directory,
            static_data_tables_file,
        } => {
            commands::export_discrete(&source, &directory, static_data_tables_file.as_deref())
                .await
        }
    }
}
