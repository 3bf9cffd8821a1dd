//! Initialize command implementation

use crate::storage::bootstrap::{bootstrap, HttpSpecSource, SpecSource};
use crate::storage::{StorageRoot, TruncatedNTupleLayout};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the init command
pub fn execute(storage_root: PathBuf, depth: usize, no_spec_copy: bool) -> Result<i32> {
    let layout = TruncatedNTupleLayout::new(depth)?;
    let storage = StorageRoot::new(&storage_root, layout);

    let http = HttpSpecSource::default();
    let spec_source: Option<&dyn SpecSource> = if no_spec_copy { None } else { Some(&http) };
    let report = bootstrap(&storage, spec_source)?;

    if report.created {
        println!("{} Created OCFL storage root", "✓".green().bold());
    } else {
        println!("{} Storage root already initialized", "✓".green().bold());
    }
    println!("  • Root: {}", storage.root().display().to_string().cyan());
    println!("  • Workspace: {}", storage.workspace().display());
    println!("  • Depth: {}", storage.layout().depth());
    println!("  • Objects: {}", storage.object_ids().len());
    if report.spec_copy_written {
        println!("  • Specification copy downloaded");
    }

    Ok(0)
}
