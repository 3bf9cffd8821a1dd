//! Remote repository capability
//!
//! The pipeline only needs a handful of things from the repository it
//! migrates from: paged search, asset and folder lookups, and a blocking
//! export that leaves a zip archive on local disk. [`RepositoryClient`] is
//! that seam; [`PreservicaClient`] implements it over HTTP and tests
//! substitute an in-memory fake.

pub mod preservica;
pub mod search;

use crate::core::error::Result;
use crate::core::types::ObjectId;
use tempfile::TempPath;

pub use preservica::PreservicaClient;
pub use search::{SearchPage, SearchQuery, SearchResults};

/// Account and server a run is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
    pub username: String,
    pub server: String,
    pub tenant: String,
}

impl RemoteIdentity {
    /// Originating system name, `"<server> (<tenant>)"`
    pub fn system_name(&self) -> String {
        format!("{} ({})", self.server, self.tenant)
    }
}

/// An asset (information object) in the remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub reference: ObjectId,
    pub title: String,
}

/// A folder (structural object) used to scope discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub reference: String,
    pub title: String,
}

/// What an export package should contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_content: String,
    pub include_metadata: String,
    pub included_generations: String,
    pub include_parent_hierarchy: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_content: "Content".to_string(),
            include_metadata: "Metadata".to_string(),
            included_generations: "All".to_string(),
            include_parent_hierarchy: false,
        }
    }
}

impl ExportOptions {
    pub fn with_parent_hierarchy(mut self, include: bool) -> Self {
        self.include_parent_hierarchy = include;
        self
    }
}

/// Operations the migration needs from the remote repository
pub trait RepositoryClient: Send + Sync {
    /// Identity used for version attribution
    fn identity(&self) -> &RemoteIdentity;

    /// One page of references matching `query`, starting at `start`
    fn search_page(&self, query: &SearchQuery, start: usize, max: usize) -> Result<SearchPage>;

    /// Look up an asset by reference
    fn asset(&self, reference: &ObjectId) -> Result<Asset>;

    /// Look up a folder by reference
    fn folder(&self, reference: &str) -> Result<Folder>;

    /// Export an asset and block until the package is downloaded. The
    /// archive is deleted when the returned path is dropped.
    fn export_by_reference(
        &self,
        reference: &ObjectId,
        options: &ExportOptions,
    ) -> Result<TempPath>;
}
