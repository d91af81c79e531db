//! Configuration and data structures shared by every pipeline stage.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default RAN1 meeting documents directory.
pub const DEFAULT_BASE_URL: &str = "https://www.3gpp.org/ftp/meetings_3gpp_sync/RAN1/Docs/";

/// Document extensions handed to the converter (lowercase, without the dot).
pub const SUPPORTED_FORMATS: &[&str] = &["pdf", "docx", "doc", "pptx", "ppt", "xlsx", "xls"];

/// Naming convention of a TDoc archive: `<prefix>-<digits>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPattern {
    /// Working group prefix (e.g., `"R1"`)
    pub prefix: String,
    /// Exact number of digits after the dash
    pub digits: usize,
    /// Archive extension without the dot
    pub extension: String,
}

impl Default for IdentifierPattern {
    fn default() -> Self {
        Self {
            prefix: "R1".to_string(),
            digits: 7,
            extension: "zip".to_string(),
        }
    }
}

impl IdentifierPattern {
    /// Compiles the pattern into a regex matching a whole trailing path segment.
    ///
    /// The single capture group holds the bare filename.
    pub fn to_regex(&self) -> Result<Regex, regex::Error> {
        let pattern = format!(
            r"(?:^|/)({}-\d{{{}}}\.{})$",
            regex::escape(&self.prefix),
            self.digits,
            regex::escape(&self.extension)
        );
        Regex::new(&pattern)
    }
}

/// Stage control for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutionStage {
    /// Execute all stages
    All,
    /// Only download archives
    Download,
    /// Only extract already downloaded archives
    Extract,
    /// Only discover and convert already extracted documents
    Convert,
}

impl ExecutionStage {
    pub fn runs_download(self) -> bool {
        matches!(self, ExecutionStage::All | ExecutionStage::Download)
    }

    pub fn runs_extract(self) -> bool {
        matches!(self, ExecutionStage::All | ExecutionStage::Extract)
    }

    pub fn runs_convert(self) -> bool {
        matches!(self, ExecutionStage::All | ExecutionStage::Convert)
    }
}

/// Configuration for a pipeline run.
///
/// Built once and shared read-only with every worker.
///
/// # Example
///
/// ```
/// use tdocsync::PipelineConfig;
///
/// let config = PipelineConfig {
///     artifacts_dir: "/tmp/tdocs".into(),
///     max_workers: 8,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(config.layout().downloads_dir(), std::path::Path::new("/tmp/tdocs/tdocs"));
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory listing URL; archives are fetched relative to it
    pub base_url: String,
    /// Root of the on-disk layout (e.g., `"artifacts"`)
    pub artifacts_dir: PathBuf,
    /// Workers per stage (default: 4)
    pub max_workers: usize,
    /// Buffer size for streamed downloads in bytes (default: 8 KiB)
    pub chunk_size: usize,
    /// Timeout for the listing request (default: 30s)
    pub listing_timeout: Duration,
    /// Connect and read timeout for each download (default: 60s)
    pub download_timeout: Duration,
    /// Which archive names to pick from the listing
    pub pattern: IdentifierPattern,
    /// Lowercase extensions that are handed to the converter
    pub supported_formats: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            artifacts_dir: PathBuf::from("artifacts"),
            max_workers: 4,
            chunk_size: 8192,
            listing_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
            pattern: IdentifierPattern::default(),
            supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(&self.artifacts_dir)
    }

    /// Returns the base URL with a trailing slash so that identifiers join
    /// onto the directory instead of replacing its last segment.
    pub fn directory_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| self.supported_formats.iter().any(|f| *f == e))
    }
}

/// Derives every artifact path from the artifacts root.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("tdocs")
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.output_dir().join("html")
    }

    pub fn markdown_dir(&self) -> PathBuf {
        self.output_dir().join("markdown")
    }

    /// `tdocs/<identifier>`
    pub fn archive_path(&self, identifier: &str) -> PathBuf {
        self.downloads_dir().join(identifier)
    }

    /// `extracted/<identifier-stem>`
    pub fn extract_path(&self, identifier: &str) -> PathBuf {
        self.extract_dir().join(identifier_stem(identifier))
    }

    /// `output/html/<archive-stem>_<base-name>.html`
    pub fn html_path(&self, archive_stem: &str, base_name: &str) -> PathBuf {
        self.html_dir().join(format!("{}_{}.html", archive_stem, base_name))
    }

    /// `output/markdown/<archive-stem>_<base-name>.md`
    pub fn markdown_path(&self, archive_stem: &str, base_name: &str) -> PathBuf {
        self.markdown_dir().join(format!("{}_{}.md", archive_stem, base_name))
    }

    /// Creates every top-level directory of the layout.
    pub fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            self.downloads_dir(),
            self.extract_dir(),
            self.html_dir(),
            self.markdown_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Strips the archive extension: `R1-2301234.zip` → `R1-2301234`.
pub fn identifier_stem(identifier: &str) -> &str {
    Path::new(identifier)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(identifier)
}

/// Result status of one worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Success,
    Skip,
    Fail,
}

impl ItemStatus {
    /// Console tag printed in front of each completed item.
    pub fn tag(self) -> &'static str {
        match self {
            ItemStatus::Success => "[OK]",
            ItemStatus::Skip => "[SKIP]",
            ItemStatus::Fail => "[FAIL]",
        }
    }
}

/// What happened to one identifier or document within a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub name: String,
    pub status: ItemStatus,
    pub message: String,
}

impl ItemOutcome {
    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ItemStatus::Success, message)
    }

    pub fn skip(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ItemStatus::Skip, message)
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ItemStatus::Fail, message)
    }

    fn new(name: impl Into<String>, status: ItemStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }
}

/// A document found inside an extracted archive that the converter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertibleFile {
    /// Full path inside the extraction folder
    pub path: PathBuf,
    /// Stem of the archive the file came from (e.g., `"R1-2301234"`)
    pub archive_stem: String,
    /// Original file name (e.g., `"proposal.docx"`)
    pub file_name: String,
}

impl ConvertibleFile {
    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        identifier_stem(&self.file_name)
    }
}
