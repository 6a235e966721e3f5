//! Run output.
//!
//! Text output mirrors the progress of a run line by line; JSON output is a
//! single document printed once the run is over.

use std::io::Write;

use anyhow::Result;
use nexus_cleaner_core::{ImagePlan, ImageVersion, RetentionPlan, RetentionPolicy};
use serde::Serialize;

const KEEP_MARK: &str = "\u{2714}";
const DELETE_MARK: &str = "\u{2715}";

/// Output format of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Outcome of one repository.
#[derive(Debug, Serialize)]
pub struct RepositoryReport {
    pub repository: String,
    pub plan: RetentionPlan,
    pub deleted: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub policy: RetentionPolicy,
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    pub fn new(policy: RetentionPolicy, dry_run: bool) -> Self {
        Self {
            dry_run,
            policy,
            repositories: Vec::new(),
        }
    }

    pub fn deleted(&self) -> usize {
        self.repositories.iter().map(|r| r.deleted).sum()
    }

    pub fn retained(&self) -> usize {
        self.repositories.iter().map(|r| r.plan.retained_count()).sum()
    }
}

/// Prints progress and results in the selected format.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
    full_info: bool,
}

impl Reporter {
    pub const fn new(format: OutputFormat, full_info: bool) -> Self {
        Self { format, full_info }
    }

    const fn is_text(self) -> bool {
        matches!(self.format, OutputFormat::Text)
    }

    pub fn header(self, nexus_url: &str, policy: &RetentionPolicy, dry_run: bool) {
        if !self.is_text() {
            return;
        }

        println!("Nexus Cleaner");
        println!("=============");
        println!("  Nexus:     {nexus_url}");
        println!("  Keep last: {}", policy.keep_last);
        if let Some(days) = policy.older_than_days {
            println!("  Older than: {days} days");
        }
        if !policy.names.is_empty() {
            println!("  Images:    {}", policy.names.join(", "));
        }
        if dry_run {
            println!();
            println!("TEST RUN - nothing will be deleted");
        }
    }

    pub fn repository(self, repository: &str, plan: &RetentionPlan) {
        if !self.is_text() {
            return;
        }

        println!();
        println!(
            "Repository {repository}: {} images, {} versions to delete",
            plan.images().len(),
            plan.deletion_count()
        );

        if self.full_info {
            for image in plan.images() {
                println!();
                for line in full_info_lines(image) {
                    println!("{line}");
                }
            }
        }
    }

    /// Prints the start of a progress line; the outcome follows on the same
    /// line once the delete call returns.
    pub fn deleting(self, version: &ImageVersion) -> Result<()> {
        if self.is_text() {
            print!("deleting {version} .. ");
            std::io::stdout().flush()?;
        }
        Ok(())
    }

    pub fn deleted(self, outcome: &str) {
        if self.is_text() {
            println!("{outcome}");
        }
    }

    pub fn finish(self, report: &RunReport) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", summary_line(report));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
        }
        Ok(())
    }
}

/// Lines of the verbose listing of one image: its name, then every version
/// oldest first with a keep marker.
pub fn full_info_lines(image: &ImagePlan) -> Vec<String> {
    std::iter::once(image.name.clone())
        .chain(image.versions().into_iter().map(|version| {
            let mark = if image.is_kept(version) {
                KEEP_MARK
            } else {
                DELETE_MARK
            };
            format!("{version} [keep: {mark}]")
        }))
        .collect()
}

pub fn summary_line(report: &RunReport) -> String {
    let deleted = report.deleted();
    let retained = report.retained();

    if deleted == 0 {
        format!("Nothing to delete ({retained} versions kept)")
    } else if report.dry_run {
        format!("Would delete {deleted} versions ({retained} kept)")
    } else {
        format!("Deleted {deleted} versions ({retained} kept)")
    }
}
