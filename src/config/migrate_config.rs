//! Settings for one migration run

use crate::core::error::Result;
use crate::core::types::DEFAULT_VERSION_MESSAGE;
use crate::storage::layout::TruncatedNTupleLayout;
use crate::storage::root::{default_workspace, StorageRoot};
use std::path::PathBuf;

/// Fewest export workers
pub const MIN_WORKERS: usize = 1;
/// Most export workers
pub const MAX_WORKERS: usize = 8;
/// Export workers used when none are requested
pub const DEFAULT_WORKERS: usize = 2;

/// Clamp a requested worker count into the supported range
pub fn clamp_workers(requested: usize) -> usize {
    requested.clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Everything a run needs besides the remote client
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub storage_root: PathBuf,
    pub workspace: PathBuf,
    pub workers: usize,
    pub layout: TruncatedNTupleLayout,
    /// Parent collection reference limiting discovery
    pub collection: Option<String>,
    pub include_parent_hierarchy: bool,
    pub message: String,
    /// Fetch the human-readable OCFL specification during bootstrap
    pub spec_copy: bool,
}

impl MigrateConfig {
    /// Defaults for a root; `depth` is validated here
    pub fn new(storage_root: impl Into<PathBuf>, depth: usize) -> Result<Self> {
        let storage_root = storage_root.into();
        Ok(Self {
            workspace: default_workspace(&storage_root),
            storage_root,
            workers: DEFAULT_WORKERS,
            layout: TruncatedNTupleLayout::new(depth)?,
            collection: None,
            include_parent_hierarchy: false,
            message: DEFAULT_VERSION_MESSAGE.to_string(),
            spec_copy: true,
        })
    }

    pub fn with_workers(mut self, requested: usize) -> Self {
        self.workers = clamp_workers(requested);
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_collection(mut self, collection: Option<String>) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_parent_hierarchy(mut self, include: bool) -> Self {
        self.include_parent_hierarchy = include;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_spec_copy(mut self, spec_copy: bool) -> Self {
        self.spec_copy = spec_copy;
        self
    }

    /// Storage root addressed with this configuration's layout
    pub fn storage(&self) -> StorageRoot {
        StorageRoot::new(&self.storage_root, self.layout).with_workspace(&self.workspace)
    }
}
