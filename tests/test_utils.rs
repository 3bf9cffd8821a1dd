//! Test utilities for preservica-ocfl tests
//!
//! An in-memory repository client plus helpers that build export archives
//! shaped like the ones the remote produces.

#![allow(dead_code)]

use parking_lot::Mutex;
use preservica_ocfl::core::error::{OcflError, Result};
use preservica_ocfl::core::types::ObjectId;
use preservica_ocfl::remote::{
    Asset, ExportOptions, Folder, RemoteIdentity, RepositoryClient, SearchPage, SearchQuery,
};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir, TempPath};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const TEST_SERVER: &str = "eu.example.com";
pub const TEST_TENANT: &str = "ACME";
pub const TEST_USERNAME: &str = "archivist@acme.org";

/// Build a zip archive holding `entries` in order. Names ending in `/`
/// become directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Descriptor bytes for an asset's package
pub fn descriptor(id: &ObjectId) -> Vec<u8> {
    format!(
        concat!(
            "<opex:OPEXMetadata xmlns:opex=\"http://www.openpreservationexchange.org/opex/v1.2\">",
            "<opex:Properties><opex:Title>{}</opex:Title></opex:Properties>",
            "</opex:OPEXMetadata>",
        ),
        id
    )
    .into_bytes()
}

/// Export archive for one asset: its descriptor next to a nested package
/// holding `files`
pub fn package_archive(id: &ObjectId, files: &[(&str, &[u8])]) -> Vec<u8> {
    let inner = zip_bytes(files);
    let descriptor_name = format!("{}.pax.zip.opex", id);
    let package_name = format!("{}.pax.zip", id);
    let descriptor = descriptor(id);
    zip_bytes(&[
        (descriptor_name.as_str(), descriptor.as_slice()),
        (package_name.as_str(), inner.as_slice()),
    ])
}

/// The three files every well-formed test package carries
pub fn sample_files(id: &ObjectId) -> Vec<(String, Vec<u8>)> {
    vec![
        (
            format!("{}/Representation_Preservation/page-1.tif", id),
            format!("image one of {}", id).into_bytes(),
        ),
        (
            format!("{}/Representation_Preservation/page-2.tif", id),
            format!("image two of {}", id).into_bytes(),
        ),
        (format!("{}/{}.xip", id, id), b"<XIP/>".to_vec()),
    ]
}

/// `package_archive` over `sample_files`
pub fn sample_archive(id: &ObjectId) -> Vec<u8> {
    let files = sample_files(id);
    let borrowed: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(path, content)| (path.as_str(), content.as_slice()))
        .collect();
    package_archive(id, &borrowed)
}

/// In-memory repository
pub struct FakeClient {
    identity: RemoteIdentity,
    references: Vec<String>,
    archives: HashMap<ObjectId, Vec<u8>>,
    failing: HashSet<ObjectId>,
    fail_search_from: Option<usize>,
    delay: Duration,
    downloads: TempDir,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    exports: AtomicUsize,
    archive_paths: Mutex<Vec<PathBuf>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            identity: RemoteIdentity {
                username: TEST_USERNAME.to_string(),
                server: TEST_SERVER.to_string(),
                tenant: TEST_TENANT.to_string(),
            },
            references: Vec::new(),
            archives: HashMap::new(),
            failing: HashSet::new(),
            fail_search_from: None,
            delay: Duration::ZERO,
            downloads: TempDir::new().unwrap(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            exports: AtomicUsize::new(0),
            archive_paths: Mutex::new(Vec::new()),
        }
    }

    /// Client holding `count` well-formed assets; returns their ids in
    /// discovery order
    pub fn with_assets(count: usize) -> (Self, Vec<ObjectId>) {
        let mut client = Self::new();
        let ids: Vec<ObjectId> = (0..count).map(|_| ObjectId::new_v4()).collect();
        for id in &ids {
            client = client.with_archive(*id, sample_archive(id));
        }
        (client, ids)
    }

    /// Add an asset whose export yields `archive`
    pub fn with_archive(mut self, id: ObjectId, archive: Vec<u8>) -> Self {
        self.references.push(id.to_string());
        self.archives.insert(id, archive);
        self
    }

    /// Add a raw reference to the search results
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    /// Exports of `id` fail remotely
    pub fn with_failing_export(mut self, id: ObjectId) -> Self {
        self.failing.insert(id);
        self
    }

    /// Search pages starting at or after `start` fail
    pub fn with_search_failure_from(mut self, start: usize) -> Self {
        self.fail_search_from = Some(start);
        self
    }

    /// Each export takes at least `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn export_count(&self) -> usize {
        self.exports.load(Ordering::SeqCst)
    }

    /// Local paths of every archive handed out so far
    pub fn archive_paths(&self) -> Vec<PathBuf> {
        self.archive_paths.lock().clone()
    }
}

impl RepositoryClient for FakeClient {
    fn identity(&self) -> &RemoteIdentity {
        &self.identity
    }

    fn search_page(&self, _query: &SearchQuery, start: usize, max: usize) -> Result<SearchPage> {
        if matches!(self.fail_search_from, Some(from) if start >= from) {
            return Err(OcflError::remote("search service unavailable"));
        }
        let end = (start + max).min(self.references.len());
        let references = if start < end {
            self.references[start..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(SearchPage {
            references,
            total_hits: self.references.len(),
        })
    }

    fn asset(&self, reference: &ObjectId) -> Result<Asset> {
        if !self.archives.contains_key(reference) && !self.failing.contains(reference) {
            return Err(OcflError::remote(format!("no asset {}", reference)));
        }
        Ok(Asset {
            reference: *reference,
            title: format!("Asset {}", reference),
        })
    }

    fn folder(&self, reference: &str) -> Result<Folder> {
        Ok(Folder {
            reference: reference.to_string(),
            title: "Test collection".to_string(),
        })
    }

    fn export_by_reference(
        &self,
        reference: &ObjectId,
        _options: &ExportOptions,
    ) -> Result<TempPath> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.exports.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let result = if self.failing.contains(reference) {
            Err(OcflError::ExportFailed {
                id: reference.to_string(),
                reason: "export job failed".to_string(),
            })
        } else {
            match self.archives.get(reference) {
                Some(bytes) => {
                    let mut file = NamedTempFile::new_in(self.downloads.path()).unwrap();
                    file.write_all(bytes).unwrap();
                    let path = file.into_temp_path();
                    self.archive_paths.lock().push(path.to_path_buf());
                    Ok(path)
                }
                None => Err(OcflError::remote(format!("no asset {}", reference))),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
