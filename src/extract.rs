//! ZIP archive extraction logic.

use crate::error::PipelineError;
use crate::types::{ArtifactLayout, ItemOutcome};
use std::path::Path;
use tracing::{debug, warn};

/// Extracts one downloaded archive into `extracted/<stem>/`.
///
/// This is blocking; the orchestrator runs it on the blocking thread pool.
///
/// # Arguments
///
/// * `layout` - Artifact layout
/// * `identifier` - Archive filename (e.g., `"R1-2301234.zip"`)
///
/// # Returns
///
/// The item outcome; a corrupt archive yields `Fail "Invalid ZIP file"`.
pub fn extract_archive(layout: &ArtifactLayout, identifier: &str) -> ItemOutcome {
    let archive_path = layout.archive_path(identifier);
    let extract_path = layout.extract_path(identifier);

    if !archive_path.exists() {
        return ItemOutcome::skip(identifier, "Not downloaded");
    }

    if is_non_empty_dir(&extract_path) {
        return ItemOutcome::skip(identifier, "Already extracted");
    }

    match unpack_zip(&archive_path, &extract_path) {
        Ok(count) => ItemOutcome::success(identifier, format!("Extracted {} files", count)),
        Err(e) => ItemOutcome::fail(identifier, e.to_string()),
    }
}

/// A non-empty destination counts as fully extracted.
fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Unpacks every entry of `archive_path` below `dest_path`.
///
/// The archive is opened before the destination is created, so a file that
/// is not a ZIP at all leaves no folder behind.
fn unpack_zip(archive_path: &Path, dest_path: &Path) -> Result<u64, PipelineError> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(dest_path)?;

    let mut file_count = 0u64;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;

        // Root, drive and `..` components are dropped, so every entry lands
        // inside the destination.
        let relative = entry.mangled_name();
        if relative.as_os_str().is_empty() {
            warn!(
                "Skipping entry with empty path {:?} in {}",
                entry.name(),
                archive_path.display()
            );
            continue;
        }
        let out_path = dest_path.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = std::fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut outfile)?;
        file_count += 1;
    }

    debug!(
        "Unpacked {} files from {} into {}",
        file_count,
        archive_path.display(),
        dest_path.display()
    );
    Ok(file_count)
}
