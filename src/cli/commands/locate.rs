//! Locate command implementation

use crate::core::error::OcflError;
use crate::core::types::ObjectId;
use crate::storage::bootstrap::recorded_depth;
use crate::storage::layout::DEFAULT_DEPTH;
use crate::storage::{StorageLayout, StorageRoot, TruncatedNTupleLayout};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the locate command
pub fn execute(id: String, storage_root: Option<PathBuf>, depth: Option<usize>) -> Result<i32> {
    let id = ObjectId::parse(&id)?;

    let Some(root) = storage_root else {
        let layout = TruncatedNTupleLayout::new(depth.unwrap_or(DEFAULT_DEPTH))?;
        println!("{}", layout.path_for(&id).display());
        return Ok(0);
    };

    let existing = StorageRoot::new(&root, TruncatedNTupleLayout::default());
    if !existing.is_initialized() {
        return Err(OcflError::RootNotInitialized { path: root }.into());
    }
    let depth = match depth {
        Some(depth) => depth,
        None => recorded_depth(&existing)?.unwrap_or(DEFAULT_DEPTH),
    };
    let storage = StorageRoot::new(&root, TruncatedNTupleLayout::new(depth)?);
    let path = storage.object_path(&id);

    let state = if storage.exists(&id) {
        "present".green()
    } else {
        "missing".yellow()
    };
    println!("{} ({})", path.display(), state);

    Ok(0)
}
