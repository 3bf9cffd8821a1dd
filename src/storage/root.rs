//! OCFL storage root on the local filesystem
//!
//! Objects are assembled in a workspace directory and moved under the root
//! with a single rename, so an object's conformance marker and inventory only
//! become visible once everything they describe is on disk.

use crate::core::error::{OcflError, Result};
use crate::core::types::{ObjectId, VersionedObject};
use crate::storage::inventory::{Inventory, INVENTORY_FILE};
use crate::storage::layout::{StorageLayout, TruncatedNTupleLayout};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Root conformance marker
pub const ROOT_NAMASTE: &str = "0=ocfl_1.1";
/// Object conformance marker
pub const OBJECT_NAMASTE: &str = "0=ocfl_object_1.1";
/// Layout declaration descriptor
pub const ROOT_LAYOUT: &str = "ocfl_layout.json";
/// Directory holding extension configuration
pub const EXTENSIONS_DIR: &str = "extensions";

/// Suffix appended to the root path to form the default workspace
const WORKSPACE_SUFFIX: &str = "_WRKSP";

/// Content of a NAMASTE file: the part after `0=`, newline terminated
pub fn namaste_content(name: &str) -> String {
    format!("{}\n", name.trim_start_matches("0="))
}

/// A storage root plus the layout used to address its objects
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
    workspace: PathBuf,
    layout: TruncatedNTupleLayout,
}

impl StorageRoot {
    /// Open a storage root description; nothing is touched on disk
    pub fn new(root: impl Into<PathBuf>, layout: TruncatedNTupleLayout) -> Self {
        let root = root.into();
        let workspace = default_workspace(&root);
        Self {
            root,
            workspace,
            layout,
        }
    }

    /// Use a different staging directory. It must be on the same
    /// filesystem as the root.
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn layout(&self) -> &TruncatedNTupleLayout {
        &self.layout
    }

    /// True once the root conformance marker is present
    pub fn is_initialized(&self) -> bool {
        self.root.join(ROOT_NAMASTE).is_file()
    }

    /// Absolute directory of an object
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(self.layout.path_for(id))
    }

    /// An object exists only when both its conformance marker and its
    /// inventory are present. Anything less is treated as absent.
    pub fn exists(&self, id: &ObjectId) -> bool {
        let object_path = self.object_path(id);
        object_path.join(OBJECT_NAMASTE).is_file() && object_path.join(INVENTORY_FILE).exists()
    }

    /// Write a named file at the top of the root
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Durably write a new object. Fails if the object already exists.
    pub fn commit(&self, object: &VersionedObject) -> Result<PathBuf> {
        if self.exists(&object.id) {
            return Err(OcflError::ObjectAlreadyExists {
                id: object.id.to_string(),
            });
        }

        let (inventory, writes) = Inventory::build(object)?;
        let inventory_bytes = inventory.to_bytes()?;
        let (_, sidecar) = Inventory::sidecar(&inventory_bytes);

        fs::create_dir_all(&self.workspace)?;
        let staging = tempfile::Builder::new()
            .prefix(&format!("{}-", object.id))
            .tempdir_in(&self.workspace)?;
        let staged = staging.path();

        for (content_path, entry) in &writes {
            let destination = staged.join(content_path);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&destination, &entry.content)?;
        }

        for location in [staged.to_path_buf(), staged.join(&inventory.head)] {
            fs::create_dir_all(&location)?;
            fs::write(location.join(INVENTORY_FILE), &inventory_bytes)?;
            fs::write(location.join(Inventory::sidecar_name()), &sidecar)?;
        }
        fs::write(staged.join(OBJECT_NAMASTE), namaste_content(OBJECT_NAMASTE))?;

        let target = self.object_path(&object.id);
        if target.exists() {
            // leftovers of an interrupted write: no marker or no inventory
            fs::remove_dir_all(&target)?;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(staged, &target)?;
        // the staging directory now lives at `target`; skip its cleanup
        std::mem::forget(staging);

        debug!(
            id = %object.id,
            path = %target.display(),
            files = writes.len(),
            "object committed"
        );
        Ok(target)
    }

    /// Identifiers of every complete object under the root
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(self.layout.depth() + 1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?;
                ObjectId::parse(name).ok()
            })
            .filter(|id| self.exists(id))
            .collect();
        ids.sort();
        ids
    }
}

/// `<root>_WRKSP`, next to the root
pub fn default_workspace(root: &Path) -> PathBuf {
    let mut name = root
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ocfl".into());
    name.push(WORKSPACE_SUFFIX);
    root.with_file_name(name)
}
