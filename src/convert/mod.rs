//! Document conversion to HTML and Markdown.
//!
//! Interpreting office and PDF formats is left to an external converter. The
//! pipeline only sees it through three small traits: a [`ConverterFactory`]
//! hands each conversion task its own [`DocumentConverter`], which turns a
//! source file into a [`ConvertedDocument`] that can be rendered both ways.

pub mod docling;

use crate::error::{ConversionError, PipelineError};
use crate::types::{ArtifactLayout, ConvertibleFile, ItemOutcome};
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub use docling::{DoclingConverter, DoclingFactory};

/// A converted document that can be rendered to the two output formats.
pub trait ConvertedDocument {
    fn export_to_html(&self) -> Result<String, ConversionError>;
    fn export_to_markdown(&self) -> Result<String, ConversionError>;
}

/// Turns a source document into a [`ConvertedDocument`].
///
/// Instances are never shared between tasks.
pub trait DocumentConverter {
    fn convert(&mut self, source: &Path) -> Result<Box<dyn ConvertedDocument>, ConversionError>;
}

/// Creates a fresh [`DocumentConverter`] for every conversion task.
pub trait ConverterFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn DocumentConverter>, ConversionError>;
}

/// Converts one discovered document into its HTML and Markdown outputs.
///
/// When both outputs already exist the converter is not touched at all. When
/// only one exists, the document is converted again but only the missing
/// representation is rendered and written.
///
/// This is blocking; the orchestrator runs it on the blocking thread pool.
///
/// # Arguments
///
/// * `factory` - Source of the per-task converter
/// * `layout` - Artifact layout
/// * `file` - The discovered document
///
/// # Returns
///
/// The item outcome, named after the source file.
pub fn convert_document(
    factory: &dyn ConverterFactory,
    layout: &ArtifactLayout,
    file: &ConvertibleFile,
) -> ItemOutcome {
    let html_path = layout.html_path(&file.archive_stem, file.base_name());
    let md_path = layout.markdown_path(&file.archive_stem, file.base_name());

    if html_path.exists() && md_path.exists() {
        return ItemOutcome::skip(&file.file_name, "Already converted");
    }

    match render_outputs(factory, file, &html_path, &md_path) {
        Ok(()) => ItemOutcome::success(&file.file_name, "Converted"),
        Err(e) => ItemOutcome::fail(&file.file_name, e.to_string()),
    }
}

fn render_outputs(
    factory: &dyn ConverterFactory,
    file: &ConvertibleFile,
    html_path: &Path,
    md_path: &Path,
) -> Result<(), PipelineError> {
    let mut converter = factory.create()?;
    let document = converter.convert(&file.path)?;

    if !html_path.exists() {
        let html = document.export_to_html()?;
        write_output(html_path, &html)?;
        debug!("Wrote {}", html_path.display());
    }

    if !md_path.exists() {
        let markdown = document.export_to_markdown()?;
        write_output(md_path, &markdown)?;
        debug!("Wrote {}", md_path.display());
    }

    Ok(())
}

/// Writes through a temporary sibling and renames it into place, so an
/// interrupted write never leaves a file that reads as "already converted".
fn write_output(path: &Path, content: &str) -> Result<(), PipelineError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
