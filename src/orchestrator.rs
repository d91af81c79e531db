//! Main orchestration logic: listing, then download, extract and convert.

use crate::convert::{convert_document, ConverterFactory};
use crate::discover::discover_documents;
use crate::download::{download_archive, download_client};
use crate::error::PipelineError;
use crate::extract::extract_archive;
use crate::listing::fetch_identifiers;
use crate::report::{
    absolute, print_banner, stage_progress_bar, OutputLocations, PipelineSummary, StageReport,
};
use crate::types::{ConvertibleFile, ExecutionStage, ItemOutcome, ItemStatus, PipelineConfig};
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Downloads, extracts and converts every TDoc on the configured listing.
///
/// This is the main entry point. It performs the following steps:
///
/// 1. Creates the artifact directories
/// 2. Fetches the directory listing (fatal on failure or zero matches)
/// 3. Downloads archives, skipping the ones already on disk
/// 4. Extracts archives, skipping non-empty extraction folders
/// 5. Discovers convertible documents and converts them to HTML and Markdown
///
/// Stages never overlap; each one gets a fresh pool of `max_workers` workers.
/// Per-item failures are recorded in the summary and never abort the run.
///
/// # Arguments
///
/// * `config` - Pipeline configuration
/// * `factory` - Converter factory; each conversion task creates its own converter
/// * `stage` - Execution stage control
///
/// # Returns
///
/// The run summary, or an error if the listing could not be obtained.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tdocsync::{run_pipeline, DoclingFactory, ExecutionStage, PipelineConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::default();
/// let summary = run_pipeline(config, Arc::new(DoclingFactory::from_path()), ExecutionStage::All).await?;
/// println!("{}", summary.render());
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(
    config: PipelineConfig,
    factory: Arc<dyn ConverterFactory>,
    stage: ExecutionStage,
) -> Result<PipelineSummary, PipelineError> {
    let config = Arc::new(config);
    let layout = config.layout();
    layout.create_all()?;
    let locations = OutputLocations::from_layout(&layout);
    info!("Download directory: {}", locations.downloads.display());
    info!("Extract directory:  {}", locations.extracted.display());
    info!("Output directory:   {}", absolute(&layout.output_dir()).display());

    let identifiers = fetch_identifiers(&config).await?;
    println!("\nTotal files to process: {}", identifiers.len());

    let mut summary = PipelineSummary {
        identifiers: identifiers.len(),
        download: None,
        extraction: None,
        conversion: None,
        locations,
    };

    if stage.runs_download() {
        print_banner("PHASE 1: DOWNLOADING FILES");
        let client = download_client(&config)?;
        let report = run_stage("download", "file", config.max_workers, identifiers.clone(), |id| {
            let client = client.clone();
            let config = Arc::clone(&config);
            async move { download_archive(&client, &config, &id).await }
        })
        .await;
        summary.download = Some(report);
    }

    if stage.runs_extract() {
        print_banner("PHASE 2: EXTRACTING FILES");
        let layout = config.layout();
        let report = run_stage("extraction", "file", config.max_workers, identifiers.clone(), |id| {
            let layout = layout.clone();
            blocking(id.clone(), move || extract_archive(&layout, &id))
        })
        .await;
        summary.extraction = Some(report);
    }

    if stage.runs_convert() {
        print_banner("PHASE 3: CONVERTING FILES");
        let documents = discover_documents(&config, &identifiers);
        println!("Found {} documents to convert\n", documents.len());

        let layout = config.layout();
        let report = run_stage("conversion", "doc", config.max_workers, documents, |document| {
            let layout = layout.clone();
            let factory = Arc::clone(&factory);
            blocking(document.file_name.clone(), move || {
                convert_document(factory.as_ref(), &layout, &document)
            })
        })
        .await;
        summary.conversion = Some(report);
    }

    if summary.total_failed() > 0 {
        warn!("{} items failed; re-run to retry them", summary.total_failed());
    }
    Ok(summary)
}

/// Display name of a stage item, used when its worker panics.
trait StageItem {
    fn item_name(&self) -> String;
}

impl StageItem for String {
    fn item_name(&self) -> String {
        self.clone()
    }
}

impl StageItem for ConvertibleFile {
    fn item_name(&self) -> String {
        self.file_name.clone()
    }
}

/// Runs one stage over `items` with at most `workers` tasks in flight.
///
/// All tasks are spawned up front and their outcomes are consumed in
/// completion order. A worker that panics is reported as a failed item.
async fn run_stage<T, F, Fut>(
    phase: &str,
    unit: &str,
    workers: usize,
    items: Vec<T>,
    task: F,
) -> StageReport
where
    T: StageItem,
    F: Fn(T) -> Fut,
    Fut: Future<Output = ItemOutcome> + Send + 'static,
{
    let started = Instant::now();
    let mut report = StageReport::new(phase, items.len());
    if items.is_empty() {
        return report;
    }

    info!("Using {} parallel workers for {}", workers, phase);
    let pb = stage_progress_bar(items.len(), phase, unit);

    // Fresh pool per stage; dropped once the stage drains.
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for item in items {
        let name = item.item_name();
        let semaphore = Arc::clone(&semaphore);
        let work = task(item);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return ItemOutcome::fail(name, "worker pool closed");
            };
            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => ItemOutcome::fail(name, "worker panicked"),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::fail("<unknown>", format!("Task failed: {}", e)),
        };
        if outcome.status == ItemStatus::Fail {
            warn!("{} failed for {}: {}", phase, outcome.name, outcome.message);
        }
        report.record(&outcome, &pb);
    }

    pb.finish_and_clear();
    report.elapsed = started.elapsed();
    info!(
        "{} finished: {} ok, {} skipped, {} failed",
        phase, report.succeeded, report.skipped, report.failed
    );
    report
}

/// Moves blocking work (unzipping, converting) onto the blocking pool.
async fn blocking<W>(name: String, work: W) -> ItemOutcome
where
    W: FnOnce() -> ItemOutcome + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|e| ItemOutcome::fail(name, format!("Task failed: {}", e)))
}
