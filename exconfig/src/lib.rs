//! # exconfig
//!
//! A Cursive-based TUI component library for export configuration editing.
//!
//! Exconfig renders one card per configuration section and lets the user
//! map export keys (optionally dot-nested) to typed field sources, with
//! catalog-driven choices and optional output formatting.
//!
//! ## Features
//!
//! - TUI interface built with [Cursive](https://github.com/gyscos/cursive)
//! - Catalog-driven source selection (database fields, metadata services,
//!   text content, computed fields)
//! - Output formatting with string/float/integer options
//! - Multi-format support: TOML and JSON configuration files
//! - Automatic backup before saving changes
//! - A resolver that applies saved configurations to data records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exconfig::data::{EditorData, catalog::Catalogs, types::ExportType};
//!
//! // Load a configuration for document exports
//! let app_data = EditorData::load(
//!     "export.json",
//!     ExportType::Document,
//!     Catalogs::default(),
//! ).unwrap();
//!
//! // Access the configuration tree
//! let json_value = app_data.as_json();
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Configuration data structures, catalogs and resolution
//! - [`run`] - TUI application runner
//! - [`ui`] - UI components and editors

/// Configuration data structures and catalog parsing.
///
/// This module provides the core data structures for managing export
/// configurations, including catalog parsing, field source management,
/// serialization and record resolution.
pub mod data;

/// TUI application runner and main entry points.
pub mod run;

/// UI components and editors for the configuration sections.
pub mod ui;

pub use run::*;
pub use serde_json::Value;
