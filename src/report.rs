//! Progress display and run summary.

use crate::error::PipelineError;
use crate::types::{ArtifactLayout, ItemOutcome, ItemStatus};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const RULE_WIDTH: usize = 70;

/// Prints a phase banner (`PHASE 1: DOWNLOADING FILES`, ...).
pub fn print_banner(title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{}\n{}\n{}", rule, title, rule);
}

/// Creates the progress bar for one stage.
pub fn stage_progress_bar(total: usize, label: &str, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.cyan}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} | {{elapsed_precise}} elapsed, ETA {{eta_precise}}",
            label, unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Formats the per-item console line, e.g. `[OK] R1-2301234.zip - 1.25 MB`.
pub fn outcome_line(outcome: &ItemOutcome) -> String {
    format!("{} {} - {}", outcome.status.tag(), outcome.name, outcome.message)
}

/// Tally of one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageReport {
    pub phase: String,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl StageReport {
    pub fn new(phase: impl Into<String>, total: usize) -> Self {
        Self {
            phase: phase.into(),
            total,
            ..Self::default()
        }
    }

    /// Counts one completed item and prints its line above the progress bar.
    pub fn record(&mut self, outcome: &ItemOutcome, pb: &ProgressBar) {
        match outcome.status {
            ItemStatus::Success => self.succeeded += 1,
            ItemStatus::Skip => self.skipped += 1,
            ItemStatus::Fail => self.failed += 1,
        }
        let line = outcome_line(outcome);
        // suspend() also prints when the bar is hidden (output not a terminal).
        pb.suspend(|| println!("{}", line));
        pb.inc(1);
    }

    pub fn completed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Resolved output directories.
#[derive(Debug, Clone, Serialize)]
pub struct OutputLocations {
    pub downloads: PathBuf,
    pub extracted: PathBuf,
    pub html: PathBuf,
    pub markdown: PathBuf,
}

impl OutputLocations {
    pub fn from_layout(layout: &ArtifactLayout) -> Self {
        Self {
            downloads: absolute(&layout.downloads_dir()),
            extracted: absolute(&layout.extract_dir()),
            html: absolute(&layout.html_dir()),
            markdown: absolute(&layout.markdown_dir()),
        }
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Everything a run produced, for the final table and `--summary-json`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub identifiers: usize,
    pub download: Option<StageReport>,
    pub extraction: Option<StageReport>,
    pub conversion: Option<StageReport>,
    pub locations: OutputLocations,
}

impl PipelineSummary {
    /// Failed items across all stages that ran.
    pub fn total_failed(&self) -> usize {
        [&self.download, &self.extraction, &self.conversion]
            .into_iter()
            .flatten()
            .map(|r| r.failed)
            .sum()
    }

    /// Writes the summary as pretty-printed JSON (`--summary-json`).
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Renders the final summary table.
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = format!("{}\nPROCESSING SUMMARY\n{}\n", rule, rule);
        out.push_str(&format!("Total TDoc files:        {}\n", self.identifiers));

        let phases = [
            ("Phase 1 - Download", "Downloaded", &self.download),
            ("Phase 2 - Extraction", "Extracted", &self.extraction),
            ("Phase 3 - Conversion", "Converted", &self.conversion),
        ];
        for (title, done, report) in phases {
            let Some(report) = report else { continue };
            out.push_str(&format!("\n{}:\n", title));
            if report.phase == "conversion" {
                out.push_str(&format!("  Total documents:       {}\n", report.total));
            }
            out.push_str(&format!("  {:<22} {}\n", format!("{}:", done), report.succeeded));
            out.push_str(&format!("  Skipped (exists):      {}\n", report.skipped));
            out.push_str(&format!("  Failed:                {}\n", report.failed));
            out.push_str(&format!(
                "  Elapsed:               {}\n",
                humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64))
            ));
        }

        out.push_str("\nOutput locations:\n");
        out.push_str(&format!("  Downloads:             {}\n", self.locations.downloads.display()));
        out.push_str(&format!("  Extracted:             {}\n", self.locations.extracted.display()));
        out.push_str(&format!("  HTML:                  {}\n", self.locations.html.display()));
        out.push_str(&format!("  Markdown:              {}\n", self.locations.markdown.display()));
        out.push_str(&rule);
        out
    }
}
