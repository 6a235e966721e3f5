//! CLI commands and argument parsing.

pub mod clean;
pub mod report;

use clap::Parser;

/// Nexus Cleaner - prune old docker image versions from Sonatype Nexus
///
/// Without flags, keeps the minimum required number of versions of every
/// image in every hosted docker repository.
#[derive(Parser)]
#[command(name = "nexus-cleaner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub clean: clean::CleanArgs,
}
