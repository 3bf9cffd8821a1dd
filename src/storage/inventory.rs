//! OCFL inventory descriptor
//!
//! Built from a [`VersionedObject`]: the manifest maps each distinct digest to
//! the single content path that stores it, and each version's state maps
//! digests to every logical path carrying that content.

use crate::core::error::{OcflError, Result};
use crate::core::hash::{sha512, DIGEST_ALGORITHM};
use crate::core::types::{version_name, ContentDigest, FileEntry, User, VersionedObject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inventory type URI for OCFL 1.1
pub const INVENTORY_TYPE: &str = "https://ocfl.io/1.1/spec/#inventory";

/// Inventory file name, at the object root and in each version directory
pub const INVENTORY_FILE: &str = "inventory.json";

/// Directory inside a version that holds content
pub const CONTENT_DIRECTORY: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub created: String,
    pub message: String,
    pub user: User,
    pub state: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: String,
    #[serde(rename = "type")]
    pub inventory_type: String,
    pub digest_algorithm: String,
    pub head: String,
    pub content_directory: String,
    pub manifest: BTreeMap<String, Vec<String>>,
    pub versions: BTreeMap<String, VersionRecord>,
}

impl Inventory {
    /// Build the inventory for an object and the content files to write,
    /// as paths relative to the object root (`v1/content/a.txt`). Content
    /// already stored under an earlier path is not written twice.
    pub fn build(object: &VersionedObject) -> Result<(Self, Vec<(String, &FileEntry)>)> {
        let head = object.head().ok_or_else(|| OcflError::EmptyObject {
            id: object.id.to_string(),
        })?;

        let mut manifest: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut versions = BTreeMap::new();
        let mut writes = Vec::new();

        for (index, version) in object.versions.iter().enumerate() {
            let name = version_name(index + 1);
            let mut state: BTreeMap<String, Vec<String>> = BTreeMap::new();

            for entry in version.files() {
                let digest = entry.digest.to_hex();
                if !manifest.contains_key(&digest) {
                    let content_path = format!("{}/{}/{}", name, CONTENT_DIRECTORY, entry.path);
                    manifest.insert(digest.clone(), vec![content_path.clone()]);
                    writes.push((content_path, entry));
                }
                state.entry(digest).or_default().push(entry.path.clone());
            }

            versions.insert(
                name,
                VersionRecord {
                    created: version.created_rfc3339(),
                    message: version.message.clone(),
                    user: version.user.clone(),
                    state,
                },
            );
        }

        let inventory = Self {
            id: object.id.to_string(),
            inventory_type: INVENTORY_TYPE.to_string(),
            digest_algorithm: DIGEST_ALGORITHM.to_string(),
            head,
            content_directory: CONTENT_DIRECTORY.to_string(),
            manifest,
            versions,
        };
        Ok((inventory, writes))
    }

    /// Serialized inventory bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Read an inventory back from JSON
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Sidecar content: `<digest> inventory.json`
    pub fn sidecar(inventory_bytes: &[u8]) -> (ContentDigest, String) {
        let digest = sha512(inventory_bytes);
        let line = format!("{} {}\n", digest.to_hex(), INVENTORY_FILE);
        (digest, line)
    }

    /// Sidecar file name for the configured algorithm
    pub fn sidecar_name() -> String {
        format!("{}.{}", INVENTORY_FILE, DIGEST_ALGORITHM)
    }
}
