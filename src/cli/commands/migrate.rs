//! Migrate command implementation

use crate::cli::{progress_bar, MigrateArgs, EXIT_FORMAT_FAILURE};
use crate::config::{Credentials, ExplicitCredentials, MigrateConfig};
use crate::migrate::{Migration, RunSummary};
use crate::remote::{PreservicaClient, RepositoryClient};
use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

/// Execute the migrate command
pub fn execute(args: MigrateArgs, show_progress: bool) -> Result<i32> {
    let explicit = ExplicitCredentials {
        username: args.username.clone(),
        password: args.password.clone(),
        server: args.server.clone(),
        tenant: args.tenant.clone(),
    };
    let (credentials, source) = Credentials::resolve(&explicit)?;
    tracing::debug!(source = %source, server = %credentials.server, "using credentials");

    let mut config = MigrateConfig::new(&args.storage_root, args.depth as usize)?
        .with_workers(args.threads)
        .with_collection(args.collection.clone())
        .with_parent_hierarchy(args.include_parent_hierarchy)
        .with_spec_copy(!args.no_spec_copy);
    if let Some(workspace) = &args.workspace {
        config = config.with_workspace(workspace);
    }
    if let Some(message) = &args.message {
        config = config.with_message(message.as_str());
    }

    let client = PreservicaClient::connect(&credentials)
        .with_context(|| format!("Failed to log in to {}", credentials.server))?;
    let client: Arc<dyn RepositoryClient> = Arc::new(client);

    println!(
        "{} {} {}",
        "Migrating".green().bold(),
        client.identity().system_name().cyan(),
        format!("into {}", config.storage_root.display()).dimmed()
    );
    println!("  • Workers: {}", config.workers);
    println!("  • Depth: {}", config.layout.depth());
    if let Some(collection) = &config.collection {
        println!("  • Collection: {}", collection.cyan());
    }

    let progress = progress_bar(show_progress);
    let migration = Migration::new(client, config).with_progress(progress.clone());
    let result = migration.run();
    progress.finish_and_clear();
    let summary = result?;

    print_summary(&summary);

    if summary.has_format_failures() {
        eprintln!(
            "{} {} export package(s) were not shaped as expected; see the log for details",
            "✗".red(),
            summary.format_failures
        );
        return Ok(EXIT_FORMAT_FAILURE);
    }
    Ok(0)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Run complete".green().bold());
    println!("  • Discovered: {}", summary.discovered);
    println!("  • Already present: {}", summary.skipped);
    println!("  • Committed: {}", summary.committed.to_string().green());
    if summary.failed > 0 {
        println!("  • Failed: {}", summary.failed.to_string().red());
    } else {
        println!("  • Failed: 0");
    }
    println!(
        "  • Elapsed: {:.1}s ({:.2} objects/s)",
        summary.elapsed.as_secs_f64(),
        summary.objects_per_second()
    );
}
