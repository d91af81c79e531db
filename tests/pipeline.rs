//! End-to-end pipeline runs against a mock directory listing.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tdocsync::{
    run_pipeline, ConversionError, ConvertedDocument, ConverterFactory, DocumentConverter,
    ExecutionStage, PipelineConfig, PipelineError,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

struct EchoFactory;

struct EchoConverter;

struct EchoDocument {
    name: String,
}

impl ConverterFactory for EchoFactory {
    fn create(&self) -> Result<Box<dyn DocumentConverter>, ConversionError> {
        Ok(Box::new(EchoConverter))
    }
}

impl DocumentConverter for EchoConverter {
    fn convert(&mut self, source: &Path) -> Result<Box<dyn ConvertedDocument>, ConversionError> {
        Ok(Box::new(EchoDocument {
            name: source.file_name().unwrap().to_string_lossy().into_owned(),
        }))
    }
}

impl ConvertedDocument for EchoDocument {
    fn export_to_html(&self) -> Result<String, ConversionError> {
        Ok(format!("<p>{}</p>", self.name))
    }

    fn export_to_markdown(&self) -> Result<String, ConversionError> {
        Ok(format!("**{}**", self.name))
    }
}

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn listing(links: &[&str]) -> String {
    let rows: String = links
        .iter()
        .map(|href| format!("<tr><td><a href=\"{}\">{}</a></td></tr>\n", href, href))
        .collect();
    format!("<html><body><table>\n{}</table></body></html>", rows)
}

async fn mount_listing(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/Docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_archive(server: &MockServer, name: &str, status: u16, body: Vec<u8>, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/Docs/{}", name)))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .expect(calls)
        .mount(server)
        .await;
}

fn config(server: &MockServer, root: &Path) -> PipelineConfig {
    PipelineConfig {
        base_url: format!("{}/Docs/", server.uri()),
        artifacts_dir: root.to_path_buf(),
        max_workers: 2,
        ..PipelineConfig::default()
    }
}

fn sorted_names(dir: PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_end_to_end_converts_supported_documents_only() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_listing(
        &server,
        listing(&[
            "/Docs/R1-2300001.zip",
            "/Docs/R1-230000.zip",
            "foo.zip",
            "R1-2300002.zip",
        ]),
    )
    .await;
    mount_archive(
        &server,
        "R1-2300001.zip",
        200,
        zip_bytes(&[("proposal.docx", "docx body"), ("notes.txt", "plain text")]),
        1,
    )
    .await;
    mount_archive(
        &server,
        "R1-2300002.zip",
        200,
        zip_bytes(&[("Docs/slides.pdf", "pdf body")]),
        1,
    )
    .await;

    let config = config(&server, root.path());
    let layout = config.layout();
    let summary = run_pipeline(config, Arc::new(EchoFactory), ExecutionStage::All)
        .await
        .unwrap();

    assert_eq!(summary.identifiers, 2);
    let download = summary.download.as_ref().unwrap();
    assert_eq!((download.succeeded, download.skipped, download.failed), (2, 0, 0));
    let extraction = summary.extraction.as_ref().unwrap();
    assert_eq!((extraction.succeeded, extraction.skipped, extraction.failed), (2, 0, 0));
    let conversion = summary.conversion.as_ref().unwrap();
    assert_eq!(conversion.total, 2);
    assert_eq!((conversion.succeeded, conversion.skipped, conversion.failed), (2, 0, 0));

    assert_eq!(
        sorted_names(layout.html_dir()),
        vec!["R1-2300001_proposal.html", "R1-2300002_slides.html"]
    );
    assert_eq!(
        sorted_names(layout.markdown_dir()),
        vec!["R1-2300001_proposal.md", "R1-2300002_slides.md"]
    );
    assert_eq!(
        std::fs::read_to_string(layout.html_path("R1-2300001", "proposal")).unwrap(),
        "<p>proposal.docx</p>"
    );
    assert!(layout
        .extract_path("R1-2300001.zip")
        .join("notes.txt")
        .exists());
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_listing(&server, listing(&["R1-2300001.zip", "R1-2300002.zip"])).await;
    // Each archive must be fetched exactly once across both runs.
    mount_archive(&server, "R1-2300001.zip", 200, zip_bytes(&[("a.docx", "a")]), 1).await;
    mount_archive(&server, "R1-2300002.zip", 200, zip_bytes(&[("b.xlsx", "b")]), 1).await;

    let first = run_pipeline(
        config(&server, root.path()),
        Arc::new(EchoFactory),
        ExecutionStage::All,
    )
    .await
    .unwrap();
    assert_eq!(first.conversion.as_ref().unwrap().succeeded, 2);

    let second = run_pipeline(
        config(&server, root.path()),
        Arc::new(EchoFactory),
        ExecutionStage::All,
    )
    .await
    .unwrap();

    for report in [&second.download, &second.extraction, &second.conversion] {
        let report = report.as_ref().unwrap();
        assert_eq!(report.skipped, 2, "{} should skip everything", report.phase);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
    }
}

#[tokio::test]
async fn test_failed_download_is_isolated() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_listing(
        &server,
        listing(&["R1-2300001.zip", "R1-2300002.zip", "R1-2300003.zip"]),
    )
    .await;
    mount_archive(&server, "R1-2300001.zip", 200, zip_bytes(&[("a.pdf", "a")]), 1).await;
    mount_archive(&server, "R1-2300002.zip", 404, Vec::new(), 1).await;
    mount_archive(&server, "R1-2300003.zip", 200, zip_bytes(&[("c.pdf", "c")]), 1).await;

    let config = config(&server, root.path());
    let layout = config.layout();
    let summary = run_pipeline(config, Arc::new(EchoFactory), ExecutionStage::Download)
        .await
        .unwrap();

    let download = summary.download.as_ref().unwrap();
    assert_eq!(download.succeeded, 2);
    assert_eq!(download.failed, 1);
    assert!(!layout.archive_path("R1-2300002.zip").exists());
    assert!(layout.archive_path("R1-2300001.zip").exists());
    assert!(summary.extraction.is_none());
    assert!(summary.conversion.is_none());
}

#[tokio::test]
async fn test_corrupt_archive_stays_eligible_for_retry() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_listing(&server, listing(&["R1-2300001.zip"])).await;
    mount_archive(&server, "R1-2300001.zip", 200, vec![b'x'; 512], 1).await;

    let config = config(&server, root.path());
    let layout = config.layout();

    for _ in 0..2 {
        let summary = run_pipeline(config.clone(), Arc::new(EchoFactory), ExecutionStage::All)
            .await
            .unwrap();
        let extraction = summary.extraction.as_ref().unwrap();
        assert_eq!(extraction.failed, 1);
        assert_eq!(extraction.skipped, 0);
        assert!(!layout.extract_path("R1-2300001.zip").exists());
        assert_eq!(summary.conversion.as_ref().unwrap().total, 0);
    }
}

#[tokio::test]
async fn test_listing_without_matches_is_fatal() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_listing(&server, listing(&["foo.zip", "R1-230000.zip"])).await;

    let err = run_pipeline(
        config(&server, root.path()),
        Arc::new(EchoFactory),
        ExecutionStage::All,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NoIdentifiers { .. }));
}

#[tokio::test]
async fn test_listing_http_error_is_fatal() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/Docs/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = run_pipeline(
        config(&server, root.path()),
        Arc::new(EchoFactory),
        ExecutionStage::All,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::ListingFailed { .. }));
    assert!(!root.path().join("tdocs").join("R1-2300001.zip").exists());
}
