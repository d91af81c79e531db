use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tdocsync::{
    run_pipeline, DoclingFactory, ExecutionStage, IdentifierPattern, PipelineConfig,
    DEFAULT_BASE_URL, SUPPORTED_FORMATS,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "tdocsync")]
#[command(about = "Download 3GPP TDoc archives, extract them and convert documents to HTML and Markdown", long_about = None)]
#[command(version)]
struct Args {
    /// Directory listing URL; archives are fetched relative to it
    #[arg(long, env = "TDOCSYNC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Root directory for downloads, extracted files and converted output
    #[arg(short, long, env = "TDOCSYNC_ARTIFACTS", default_value = "artifacts")]
    artifacts: PathBuf,

    /// Parallel workers per stage
    #[arg(short = 'j', long, default_value_t = 4)]
    workers: usize,

    /// TDoc prefix to match (e.g., R1, R2)
    #[arg(long, default_value = "R1")]
    prefix: String,

    /// Number of digits after the prefix
    #[arg(long, default_value_t = 7)]
    digits: usize,

    /// Which stages to run
    #[arg(long, value_enum, default_value = "all")]
    stage: ExecutionStage,

    /// Timeout for fetching the directory listing (e.g., "30s")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    listing_timeout: Duration,

    /// Connect/read timeout for each archive download (e.g., "60s")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "60s")]
    download_timeout: Duration,

    /// Download write buffer size in bytes
    #[arg(long, default_value_t = 8192)]
    chunk_size: usize,

    /// Path to the docling executable (defaults to a PATH lookup)
    #[arg(long, env = "DOCLING_BIN")]
    docling_bin: Option<PathBuf>,

    /// Also write the run summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for progress and item lines.
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("tdocsync={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let rule = "=".repeat(70);
    println!("{}\n3GPP TDoc Downloader, Extractor, and Converter\n{}", rule, rule);

    if args.workers == 0 {
        eprintln!("Error: --workers must be at least 1");
        std::process::exit(1);
    }

    let factory = match args.docling_bin {
        Some(path) => DoclingFactory::new(Some(path)),
        None => DoclingFactory::from_path(),
    };
    match factory.binary_path() {
        Some(path) => info!("Using docling at {}", path.display()),
        None if args.stage.runs_convert() => {
            warn!("docling not found in PATH; document conversions will fail")
        }
        None => {}
    }

    let config = PipelineConfig {
        base_url: args.base_url,
        artifacts_dir: args.artifacts,
        max_workers: args.workers,
        chunk_size: args.chunk_size,
        listing_timeout: args.listing_timeout,
        download_timeout: args.download_timeout,
        pattern: IdentifierPattern {
            prefix: args.prefix,
            digits: args.digits,
            ..IdentifierPattern::default()
        },
        supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
    };

    match run_pipeline(config, Arc::new(factory), args.stage).await {
        Ok(summary) => {
            println!("\n{}", summary.render());
            if let Some(path) = args.summary_json {
                // The run itself completed; a failed summary write is not fatal.
                match summary.write_json(&path) {
                    Ok(()) => info!("Wrote summary to {}", path.display()),
                    Err(e) => warn!("Failed to write summary to {}: {}", path.display(), e),
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
