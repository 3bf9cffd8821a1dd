//! Single-object export: download, unpack, assemble one version, commit

use crate::core::error::Result;
use crate::core::types::{ObjectId, User, Version, VersionedObject, DEFAULT_VERSION_MESSAGE};
use crate::remote::{ExportOptions, RepositoryClient};
use crate::storage::archive::{ArchiveUnpacker, UnpackMode};
use crate::storage::root::StorageRoot;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Exports one asset into the storage root. Shared by every worker.
pub struct ObjectExporter {
    client: Arc<dyn RepositoryClient>,
    storage: Arc<StorageRoot>,
    unpacker: ArchiveUnpacker,
    options: ExportOptions,
    message: String,
}

impl ObjectExporter {
    pub fn new(
        client: Arc<dyn RepositoryClient>,
        storage: Arc<StorageRoot>,
        include_parent_hierarchy: bool,
    ) -> Self {
        Self {
            client,
            storage,
            unpacker: ArchiveUnpacker::new(UnpackMode::from_parent_hierarchy(
                include_parent_hierarchy,
            )),
            options: ExportOptions::default().with_parent_hierarchy(include_parent_hierarchy),
            message: DEFAULT_VERSION_MESSAGE.to_string(),
        }
    }

    /// Override the version message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn storage(&self) -> &StorageRoot {
        &self.storage
    }

    /// Export `id` and commit it as a new single-version object.
    ///
    /// Any failure is confined to this object. The downloaded archive is
    /// removed before this returns, whatever the outcome.
    pub fn export(&self, id: &ObjectId) -> Result<ObjectId> {
        let asset = self.client.asset(id)?;
        debug!(id = %id, title = %asset.title, "exporting asset");

        let archive = self.client.export_by_reference(id, &self.options)?;
        let files = self.unpacker.unpack_file(&archive);
        drop(archive);
        let files = files?;

        let identity = self.client.identity();
        let user = User {
            name: identity.system_name(),
            address: identity.username.clone(),
        };
        let mut version = Version::new(Utc::now(), user, self.message.clone());
        version.extend_files(files)?;

        let mut object = VersionedObject::new(*id);
        object.push_version(version);
        self.storage.commit(&object)?;

        Ok(*id)
    }
}
