//! Core library for pdftables
//!
//! This crate implements the **Functional Core** of the pdftables application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`pdftables_core`** (this crate): table detection and export formatting, no file I/O
//! - **`pdf`**: reads PDF bytes and implements [`provider::PageGeometryProvider`]
//! - **`pdftables`**: the CLI that loads files, runs the pipeline and writes artifacts
//!
//! Every extractor is a pure function of one page's geometry: the same tokens
//! and ruled regions always produce the same tables. That makes the whole
//! pipeline testable with hand-built fixtures through
//! [`provider::MemoryProvider`].
//!
//! # Module Organization
//!
//! - [`types`]: tokens, rows, tables, identifiers and the document result
//! - [`config`]: tolerances and strategy selection
//! - [`lines`]: reconstruct text lines from tokens
//! - [`bordered`], [`borderless`], [`delimited`]: the extraction strategies
//! - [`provider`]: the geometry provider seam
//! - [`aggregate`]: run the strategies over a document and assign identifiers
//! - [`export`]: CSV, ZIP and XLSX rendering plus previews
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pdftables_core::{extract_document, to_csv, ExtractorConfig};
//!
//! let result = extract_document(&provider, &ExtractorConfig::default());
//! for table in &result.tables {
//!     println!("{}\n{}", table.id, to_csv(table)?);
//! }
//! ```

pub mod aggregate;
pub mod bordered;
pub mod borderless;
pub mod config;
pub mod delimited;
pub mod export;
pub mod lines;
pub mod provider;
pub mod types;

pub use aggregate::{extract_document, extract_page, DocumentContext};
pub use config::{ConfigError, ExtractorConfig};
pub use export::{
    previews, summary, to_csv, to_xlsx, to_zip, ExportError, ExtractionSummary, TablePreview,
};
pub use provider::{MemoryProvider, PageGeometry, PageGeometryProvider, ProviderError};
pub use types::*;
