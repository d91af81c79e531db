//! Error types for pipeline operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the pipeline.
///
/// Only [`PipelineError::ListingFailed`] and [`PipelineError::NoIdentifiers`]
/// ever escape [`crate::run_pipeline`]; everything else is raised inside a
/// single worker and turned into a failed [`crate::ItemOutcome`].
#[derive(Error, Debug)]
pub enum PipelineError {
    /// I/O error during file operations.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// HTTP request error during download.
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    /// JSON serialization error while writing the summary file.
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// Archive download failure not covered by an HTTP or I/O error.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// ZIP error other than a malformed archive.
    #[error(transparent)]
    ZipError(zip::result::ZipError),

    /// The archive is not a readable ZIP file.
    #[error("Invalid ZIP file")]
    InvalidArchive,

    /// Document conversion failure.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The identifier naming pattern does not compile.
    #[error("Invalid identifier pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The directory listing could not be fetched.
    #[error("Error fetching document list from {url}: {reason}")]
    ListingFailed { url: String, reason: String },

    /// The directory listing contained no matching identifiers.
    #[error("No TDoc files found at {url}")]
    NoIdentifiers { url: String },
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        use zip::result::ZipError;
        match err {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                PipelineError::InvalidArchive
            }
            ZipError::Io(e) => PipelineError::IoError(e),
            other => PipelineError::ZipError(other),
        }
    }
}

/// Errors raised by a document converter backend.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The converter could not be instantiated.
    #[error("Converter unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed on the source document.
    #[error("Conversion of {} failed: {reason}", .path.display())]
    Failed { path: PathBuf, reason: String },

    /// I/O error while talking to the backend.
    #[error(transparent)]
    IoError(#[from] io::Error),
}
