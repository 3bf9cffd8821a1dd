//! Command-line interface for preservica-ocfl

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

pub mod commands;

/// Exit code when one or more export packages had an unexpected shape
pub const EXIT_FORMAT_FAILURE: i32 = 2;

/// preservica-ocfl - populate an OCFL storage root from Preservica
#[derive(Parser)]
#[command(
    name = "preservica-ocfl",
    version,
    about = "Create a local OCFL storage root from a Preservica repository",
    long_about = "Exports every asset of a Preservica repository (or of one collection) \
                  as an OPEX package and stores it as an OCFL object. Objects already \
                  present in the storage root are skipped, so runs can be repeated."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export assets into the storage root, skipping existing objects
    Migrate(MigrateArgs),

    /// Create (or re-validate) a storage root without exporting anything
    Init {
        /// The OCFL storage root
        #[arg(short = 'r', long)]
        storage_root: PathBuf,

        /// Directory levels derived from the identifier (1-4)
        #[arg(
            short,
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u64).range(1..=4)
        )]
        depth: u64,

        /// Do not download the human-readable OCFL specification
        #[arg(long)]
        no_spec_copy: bool,
    },

    /// Show where an object lives in a storage root
    Locate {
        /// Object identifier (UUID)
        id: String,

        /// The OCFL storage root
        #[arg(short = 'r', long)]
        storage_root: Option<PathBuf>,

        /// Directory levels derived from the identifier (default: the root's own, else 2)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=4))]
        depth: Option<u64>,
    },
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// The OCFL storage root
    #[arg(short = 'r', long)]
    pub storage_root: PathBuf,

    /// The Preservica parent collection reference
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Number of concurrent exports (clamped to 1-8)
    #[arg(short, long, default_value_t = 2)]
    pub threads: usize,

    /// Directory levels derived from the identifier (1-4)
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=4))]
    pub depth: u64,

    /// Export with the parent folder hierarchy and store every file verbatim
    #[arg(long)]
    pub include_parent_hierarchy: bool,

    /// Your Preservica username if not using credentials.toml
    #[arg(short, long)]
    pub username: Option<String>,

    /// Your Preservica password if not using credentials.toml
    #[arg(short, long)]
    pub password: Option<String>,

    /// Your Preservica server domain name if not using credentials.toml
    #[arg(short, long)]
    pub server: Option<String>,

    /// Preservica tenant
    #[arg(long)]
    pub tenant: Option<String>,

    /// Staging directory (default: <storage-root>_WRKSP)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Message recorded on each new version
    #[arg(short, long)]
    pub message: Option<String>,

    /// Do not download the human-readable OCFL specification
    #[arg(long)]
    pub no_spec_copy: bool,
}

/// Run the parsed command line, returning the process exit code
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    let show_progress = !(cli.no_progress || cli.quiet);
    match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, show_progress),
        Commands::Init {
            storage_root,
            depth,
            no_spec_copy,
        } => commands::init::execute(storage_root, depth as usize, no_spec_copy),
        Commands::Locate {
            id,
            storage_root,
            depth,
        } => commands::locate::execute(id, storage_root, depth.map(|d| d as usize)),
    }
}

/// Spinner reporting run counters, or a hidden bar when disabled
pub fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    let template = "{spinner:.green} [{elapsed_precise}] {msg}";
    if let Ok(style) = ProgressStyle::default_spinner().template(template) {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrate_defaults() {
        let cli = Cli::try_parse_from(["preservica-ocfl", "migrate", "-r", "/data/ocfl"]).unwrap();
        match cli.command {
            Commands::Migrate(args) => {
                assert_eq!(args.threads, 2);
                assert_eq!(args.depth, 2);
                assert!(!args.include_parent_hierarchy);
                assert!(args.collection.is_none());
            }
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_depth_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["preservica-ocfl", "migrate", "-r", "x", "-d", "5"]).is_err());
        assert!(Cli::try_parse_from(["preservica-ocfl", "init", "-r", "x", "-d", "0"]).is_err());
    }

    #[test]
    fn test_storage_root_required() {
        assert!(Cli::try_parse_from(["preservica-ocfl", "migrate"]).is_err());
    }
}
