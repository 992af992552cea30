//! Command line entry point for exportool.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{ExportConfigHandler, ExportTypeArg, SectionArg};

mod commands;

/// A command line tool for export configuration management.
#[derive(Parser)]
#[command(name = "exportool", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an export configuration in the TUI editor.
    Edit {
        /// Path to the configuration file (`.json` or `.toml`).
        config: PathBuf,
        /// Export type to configure.
        #[arg(long, value_enum, default_value_t = ExportTypeArg::Document)]
        export_type: ExportTypeArg,
        /// Path to a catalog document backing the editor choices.
        #[arg(long)]
        catalogs: Option<PathBuf>,
        /// Path to a sample record used to derive metadata catalogs.
        #[arg(long)]
        samples: Option<PathBuf>,
    },
    /// Apply one section of a configuration to a record document.
    Apply {
        /// Path to the configuration file.
        config: PathBuf,
        /// Path to the record document (JSON).
        record: PathBuf,
        /// Section of the configuration to apply.
        #[arg(long, value_enum)]
        section: SectionArg,
        /// Write the result here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the dot-notation keys of a record document.
    Keys {
        /// Path to the record document (JSON).
        record: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Edit {
            config,
            export_type,
            catalogs,
            samples,
        } => ExportConfigHandler::handle_edit(&config, export_type, catalogs, samples).await,
        Commands::Apply {
            config,
            record,
            section,
            output,
        } => ExportConfigHandler::handle_apply(&config, &record, section, output).await,
        Commands::Keys { record } => ExportConfigHandler::handle_keys(&record).await,
    }
}
