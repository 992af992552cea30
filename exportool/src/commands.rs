//! Command handlers for export configuration operations.
//!
//! This module wires the CLI subcommands to the editor and resolver:
//!
//! - `edit` launches the TUI editor for a configuration file
//! - `apply` resolves one configuration section against a record
//! - `keys` lists the dot-notation keys of a record

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use log::{info, warn};
use serde_json::Value;
use tokio::fs;

use exconfig::data::{
    catalog::Catalogs,
    resolve::{RecordComputed, Resolver, flatten_keys},
    types::{ExportType, Section},
};

/// Export type selector.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportTypeArg {
    /// One output document per project document.
    Document,
    /// One output record per page.
    Page,
    /// Export of a curated collection.
    Collection,
    /// Export of a dictionary.
    Dictionary,
    /// Tag usage report.
    TagReport,
}

impl From<ExportTypeArg> for ExportType {
    fn from(arg: ExportTypeArg) -> Self {
        match arg {
            ExportTypeArg::Document => ExportType::Document,
            ExportTypeArg::Page => ExportType::Page,
            ExportTypeArg::Collection => ExportType::Collection,
            ExportTypeArg::Dictionary => ExportType::Dictionary,
            ExportTypeArg::TagReport => ExportType::TagReport,
        }
    }
}

impl fmt::Display for ExportTypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportTypeArg::Document => "document",
            ExportTypeArg::Page => "page",
            ExportTypeArg::Collection => "collection",
            ExportTypeArg::Dictionary => "dictionary",
            ExportTypeArg::TagReport => "tag-report",
        })
    }
}

/// Configuration section selector.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SectionArg {
    /// Project-level fields.
    General,
    /// Per-document fields.
    Documents,
    /// Per-page fields.
    Pages,
    /// Collection item fields.
    Items,
    /// Dictionary entry fields.
    Entries,
    /// Tag report fields.
    Tags,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::General => Section::General,
            SectionArg::Documents => Section::Documents,
            SectionArg::Pages => Section::Pages,
            SectionArg::Items => Section::Items,
            SectionArg::Entries => Section::Entries,
            SectionArg::Tags => Section::Tags,
        }
    }
}

/// Handler for export configuration operations.
pub struct ExportConfigHandler;

impl ExportConfigHandler {
    /// Handles the edit command.
    ///
    /// # Arguments
    ///
    /// * `config` - Path of the configuration file to edit.
    /// * `export_type` - Export type whose sections are shown.
    /// * `catalogs` - Optional catalog document path.
    /// * `samples` - Optional sample record to derive metadata catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or saved.
    pub async fn handle_edit(
        config: &Path,
        export_type: ExportTypeArg,
        catalogs: Option<PathBuf>,
        samples: Option<PathBuf>,
    ) -> Result<()> {
        info!("editing export configuration {}", config.display());

        if config.exists() {
            println!("Current configuration file: {}", config.display());
        } else {
            println!("No configuration file found, starting empty");
        }

        let catalogs = Self::load_catalogs(catalogs, samples).await?;
        let value = exconfig::run(config, export_type.into(), catalogs, true).await?;

        if value.is_some() {
            println!("\nExport configuration saved to {}", config.display());
        } else {
            println!("\nExport configuration unchanged");
        }

        Ok(())
    }

    /// Handles the apply command.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be read or the section
    /// is missing from the configuration.
    pub async fn handle_apply(
        config: &Path,
        record: &Path,
        section: SectionArg,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let section: Section = section.into();
        let config_value = read_value(config).await?;
        let record_value = read_value(record).await?;

        let Some(section_map) = config_value.get(section.key()) else {
            bail!(
                "configuration {} has no `{section}` section",
                config.display()
            );
        };

        let metadata = record_value.get("metadata").cloned().unwrap_or_default();
        let computed = RecordComputed::new(&record_value);
        let resolver = Resolver::new(&record_value, &metadata, &computed);
        let (result, warnings) = resolver.apply(section_map);
        for warning in warnings {
            warn!("{warning}");
        }

        let text = serde_json::to_string_pretty(&result)?;
        match output {
            Some(path) => {
                fs::write(&path, text)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Result written to {}", path.display());
            }
            None => println!("{text}"),
        }

        Ok(())
    }

    /// Handles the keys command.
    ///
    /// # Errors
    ///
    /// Returns an error if the record document cannot be read.
    pub async fn handle_keys(record: &Path) -> Result<()> {
        let record_value = read_value(record).await?;
        for key in flatten_keys(&record_value) {
            println!("{key}");
        }
        Ok(())
    }

    async fn load_catalogs(
        catalogs: Option<PathBuf>,
        samples: Option<PathBuf>,
    ) -> Result<Catalogs> {
        if let Some(path) = catalogs {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return Ok(Catalogs::from_str(&content)?);
        }
        if let Some(path) = samples {
            let record = read_value(&path).await?;
            let metadata = record.get("metadata").cloned().unwrap_or_default();
            return Ok(Catalogs::from_samples(&metadata, &metadata));
        }
        Ok(Catalogs::default())
    }
}

async fn read_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        "toml" => {
            let v: toml::Value = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            serde_json::to_value(v)?
        }
        ext => {
            bail!("Unsupported file extension: {ext:?}");
        }
    };
    Ok(value)
}
