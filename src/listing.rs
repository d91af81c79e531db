//! Directory listing fetching and identifier extraction.

use crate::error::PipelineError;
use crate::types::PipelineConfig;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};

/// Extracts every TDoc filename linked from a directory listing page.
///
/// Only anchors whose `href` ends in a path segment matching `pattern` are
/// kept. The returned names are bare filenames in the order the links appear
/// on the page.
///
/// # Arguments
///
/// * `html` - The listing page markup
/// * `pattern` - Compiled identifier pattern (see [`crate::IdentifierPattern::to_regex`])
pub fn parse_listing(html: &str, pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| {
            pattern
                .captures(href)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// Downloads the directory listing and returns the TDoc identifiers on it.
///
/// Both an unreachable listing and a listing without a single match are
/// reported as errors; the caller treats them as fatal.
///
/// # Arguments
///
/// * `config` - Pipeline configuration (listing URL, timeout, naming pattern)
///
/// # Returns
///
/// The matched identifiers, or [`PipelineError::ListingFailed`] /
/// [`PipelineError::NoIdentifiers`].
pub async fn fetch_identifiers(config: &PipelineConfig) -> Result<Vec<String>, PipelineError> {
    let url = config.base_url.as_str();
    info!("Fetching document list from: {}", url);

    let pattern = config.pattern.to_regex()?;
    let listing_failed = |reason: String| PipelineError::ListingFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(config.listing_timeout)
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| listing_failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(listing_failed(format!("HTTP {}", status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| listing_failed(e.to_string()))?;
    debug!("Listing page is {} bytes", body.len());

    let identifiers = parse_listing(&body, &pattern);
    if identifiers.is_empty() {
        return Err(PipelineError::NoIdentifiers {
            url: url.to_string(),
        });
    }

    info!("Found {} TDoc files", identifiers.len());
    Ok(identifiers)
}
