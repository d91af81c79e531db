//! tdocsync - Download, extract and convert 3GPP TDoc archives
//!
//! This library mirrors a 3GPP meeting documents directory: it downloads
//! every TDoc ZIP archive listed on the page, unpacks each one, and converts
//! the office and PDF documents inside to HTML and Markdown with an external
//! converter (docling).
//!
//! # Features
//!
//! - **Idempotent Runs**: Files already on disk are skipped, so re-running is the retry mechanism
//! - **Parallel Stages**: Each stage runs on its own bounded worker pool
//! - **Failure Isolation**: One broken archive or document never aborts the others
//! - **Progress Tracking**: Per-item status lines and a final summary
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tdocsync::{run_pipeline, DoclingFactory, ExecutionStage, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let factory = Arc::new(DoclingFactory::from_path());
//!
//! let summary = run_pipeline(config, factory, ExecutionStage::All).await?;
//! println!("{}", summary.render());
//! # Ok(())
//! # }
//! ```

pub mod convert;
mod discover;
mod download;
pub mod error;
mod extract;
mod listing;
mod orchestrator;
pub mod report;
pub mod types;

pub use convert::{
    convert_document, ConvertedDocument, ConverterFactory, DoclingConverter, DoclingFactory,
    DocumentConverter,
};
pub use discover::discover_documents;
pub use download::{download_archive, download_client};
pub use error::{ConversionError, PipelineError};
pub use extract::extract_archive;
pub use listing::{fetch_identifiers, parse_listing};
pub use orchestrator::run_pipeline;
pub use report::{OutputLocations, PipelineSummary, StageReport};
pub use types::{
    identifier_stem, ArtifactLayout, ConvertibleFile, ExecutionStage, IdentifierPattern,
    ItemOutcome, ItemStatus, PipelineConfig, DEFAULT_BASE_URL, SUPPORTED_FORMATS,
};
