//! Discovery of convertible documents inside extracted archives.

use crate::types::{identifier_stem, ConvertibleFile, PipelineConfig};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Walks the extraction folder of every identifier and collects the
/// documents the converter accepts.
///
/// Identifiers that were never extracted are ignored. Entries are visited in
/// file-name order so that repeated runs see the same list.
pub fn discover_documents(config: &PipelineConfig, identifiers: &[String]) -> Vec<ConvertibleFile> {
    let layout = config.layout();
    let mut documents = Vec::new();

    for identifier in identifiers {
        let extract_path = layout.extract_path(identifier);
        if !extract_path.is_dir() {
            continue;
        }
        let archive_stem = identifier_stem(identifier);

        for entry in WalkDir::new(&extract_path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot read entry under {}: {}", extract_path.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !config.is_supported(entry.path()) {
                continue;
            }

            documents.push(ConvertibleFile {
                path: entry.path().to_path_buf(),
                archive_stem: archive_stem.to_string(),
                file_name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
    }

    debug!("Discovered {} convertible documents", documents.len());
    documents
}
