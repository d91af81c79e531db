//! Converter backend using the external `docling` executable.

use super::{ConvertedDocument, ConverterFactory, DocumentConverter};
use crate::error::ConversionError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Creates a [`DoclingConverter`] per task.
///
/// # Examples
///
/// ```no_run
/// use tdocsync::DoclingFactory;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let factory = DoclingFactory::new(Some(PathBuf::from("/opt/docling/bin/docling")));
///
/// // Or auto-discover from PATH
/// let factory = DoclingFactory::from_path();
/// ```
#[derive(Debug, Clone)]
pub struct DoclingFactory {
    binary_path: Option<PathBuf>,
}

impl DoclingFactory {
    /// Uses `binary_path`; `None` means docling is not installed and every
    /// conversion fails with [`ConversionError::Unavailable`].
    pub fn new(binary_path: Option<PathBuf>) -> Self {
        Self { binary_path }
    }

    /// Looks `docling` up in `PATH` with the `which` crate.
    pub fn from_path() -> Self {
        Self::new(which::which("docling").ok())
    }

    pub fn binary_path(&self) -> Option<&Path> {
        self.binary_path.as_deref()
    }
}

impl ConverterFactory for DoclingFactory {
    fn create(&self) -> Result<Box<dyn DocumentConverter>, ConversionError> {
        let binary = self.binary_path.clone().ok_or_else(|| {
            ConversionError::Unavailable("docling executable not found in PATH".to_string())
        })?;
        Ok(Box::new(DoclingConverter::new(binary)?))
    }
}

/// One docling invocation context with its own scratch directory.
pub struct DoclingConverter {
    binary_path: PathBuf,
    scratch: tempfile::TempDir,
}

impl DoclingConverter {
    pub fn new(binary_path: PathBuf) -> Result<Self, ConversionError> {
        Ok(Self {
            binary_path,
            scratch: tempfile::Builder::new().prefix("tdocsync-docling").tempdir()?,
        })
    }
}

impl DocumentConverter for DoclingConverter {
    fn convert(&mut self, source: &Path) -> Result<Box<dyn ConvertedDocument>, ConversionError> {
        let failed = |reason: String| ConversionError::Failed {
            path: source.to_path_buf(),
            reason,
        };

        // Blocking wait; callers run conversions on the blocking pool.
        debug!("Running {} on {}", self.binary_path.display(), source.display());
        let output = Command::new(&self.binary_path)
            .arg(source)
            .args(["--to", "html", "--to", "md", "--output"])
            .arg(self.scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| failed(format!("failed to execute docling: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| format!("docling exited with {}", output.status));
            return Err(failed(reason));
        }

        let stem = source
            .file_stem()
            .ok_or_else(|| failed("source has no file name".to_string()))?;
        let read_rendered = |extension: &str| {
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(extension);
            let path = self.scratch.path().join(name);
            std::fs::read_to_string(&path)
                .map_err(|e| failed(format!("missing docling output {}: {}", path.display(), e)))
        };

        Ok(Box::new(RenderedDocument {
            html: read_rendered("html")?,
            markdown: read_rendered("md")?,
        }))
    }
}

/// Document already rendered by docling into both formats.
struct RenderedDocument {
    html: String,
    markdown: String,
}

impl ConvertedDocument for RenderedDocument {
    fn export_to_html(&self) -> Result<String, ConversionError> {
        Ok(self.html.clone())
    }

    fn export_to_markdown(&self) -> Result<String, ConversionError> {
        Ok(self.markdown.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let factory = DoclingFactory::new(None);
        let err = factory.create().err().unwrap();
        assert!(matches!(err, ConversionError::Unavailable(_)));
    }

    #[test]
    fn test_unrunnable_binary_fails_conversion() {
        let mut converter =
            DoclingConverter::new(PathBuf::from("/nonexistent/docling-binary-xyz")).unwrap();
        let err = converter.convert(Path::new("proposal.docx")).err().unwrap();
        assert!(err.to_string().contains("failed to execute docling"));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_rendered_outputs_from_scratch_dir() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in for docling: writes <stem>.html and <stem>.md into --output.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("docling");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             src=\"$1\"; out=\"$7\"\n\
             stem=$(basename \"$src\"); stem=\"${stem%.*}\"\n\
             echo \"<p>$stem</p>\" > \"$out/$stem.html\"\n\
             echo \"# $stem\" > \"$out/$stem.md\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut converter = DoclingConverter::new(script).unwrap();
        let document = converter.convert(Path::new("/data/R1-2300001.docx")).unwrap();

        assert_eq!(document.export_to_html().unwrap(), "<p>R1-2300001</p>\n");
        assert_eq!(document.export_to_markdown().unwrap(), "# R1-2300001\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reports_last_stderr_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("docling");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'loading models' >&2\necho 'Input document is not valid' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut converter = DoclingConverter::new(script).unwrap();
        let err = converter.convert(Path::new("broken.pdf")).err().unwrap();

        assert!(err.to_string().contains("Input document is not valid"));
    }
}
