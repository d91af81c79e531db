//! Archive download functionality.

use crate::error::PipelineError;
use crate::types::{ItemOutcome, PipelineConfig};
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use url::Url;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Builds the HTTP client shared by all download workers.
///
/// The timeout bounds both connecting and each read of the body stream, so a
/// stalled transfer fails instead of hanging its worker forever.
pub fn download_client(config: &PipelineConfig) -> Result<reqwest::Client, PipelineError> {
    let client = reqwest::Client::builder()
        .connect_timeout(config.download_timeout)
        .read_timeout(config.download_timeout)
        .user_agent(concat!("tdocsync/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Downloads one TDoc archive into the downloads directory.
///
/// An archive that is already on disk is skipped without any network access.
/// The body is streamed into a temporary sibling that is renamed into place
/// only once the transfer completes. A failed, cancelled or panicking transfer
/// drops the temporary file, so a truncated archive never appears under the
/// final name.
///
/// # Arguments
///
/// * `client` - HTTP client from [`download_client`]
/// * `config` - Pipeline configuration
/// * `identifier` - Archive filename (e.g., `"R1-2301234.zip"`)
///
/// # Returns
///
/// The item outcome; errors are folded into a `Fail` outcome.
pub async fn download_archive(
    client: &reqwest::Client,
    config: &PipelineConfig,
    identifier: &str,
) -> ItemOutcome {
    let filepath = config.layout().archive_path(identifier);

    if tokio::fs::try_exists(&filepath).await.unwrap_or(false) {
        return ItemOutcome::skip(identifier, "Already exists");
    }

    match fetch_to_file(client, config, identifier, &filepath).await {
        Ok(bytes) => {
            let size_mb = bytes as f64 / BYTES_PER_MIB;
            ItemOutcome::success(identifier, format!("{:.2} MB", size_mb))
        }
        Err(e) => {
            warn!("Download of {} failed: {}", identifier, e);
            ItemOutcome::fail(identifier, e.to_string())
        }
    }
}

/// Streams the remote archive to `filepath` through a `.part` temporary file.
///
/// Returns the size to report: the declared content length when the server
/// sent one, otherwise the number of bytes written.
async fn fetch_to_file(
    client: &reqwest::Client,
    config: &PipelineConfig,
    identifier: &str,
    filepath: &Path,
) -> Result<u64, PipelineError> {
    let base = Url::parse(&config.directory_url())
        .map_err(|e| PipelineError::DownloadFailed(format!("invalid base URL: {}", e)))?;
    let url = base
        .join(identifier)
        .map_err(|e| PipelineError::DownloadFailed(format!("invalid archive URL: {}", e)))?;
    debug!("Downloading {}", url);

    let response = client.get(url).send().await?.error_for_status()?;
    let content_length = response.content_length().filter(|&len| len > 0);

    let dir = filepath.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;
    // Removed on drop unless persisted below.
    let partial = tempfile::Builder::new()
        .prefix(&format!(".{}.", identifier))
        .suffix(".part")
        .tempfile_in(dir)?;
    let file = tokio::fs::File::from_std(partial.reopen()?);
    let mut file = BufWriter::with_capacity(config.chunk_size.max(1), file);

    let mut written = 0u64;
    let mut byte_stream = response.bytes_stream();
    while let Some(piece) = byte_stream.next().await {
        let chunk = piece?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    partial.persist(filepath).map_err(|e| e.error)?;
    Ok(content_length.unwrap_or(written))
}
