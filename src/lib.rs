//! Preservica to OCFL migration
//!
//! Builds a local OCFL 1.1 storage root from the assets of a Preservica
//! repository. Each asset is exported as an OPEX package, unpacked, and
//! committed as a single-version OCFL object addressed by a truncated
//! n-tuple tree over its UUID. Runs are idempotent: objects already present
//! in the storage root are skipped.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use preservica_ocfl::{
//!     Credentials, ExplicitCredentials, MigrateConfig, Migration, PreservicaClient,
//! };
//! use std::sync::Arc;
//!
//! let (credentials, _) = Credentials::resolve(&ExplicitCredentials::default())?;
//! let client = Arc::new(PreservicaClient::connect(&credentials)?);
//! let config = MigrateConfig::new("/data/ocfl", 2)?.with_workers(4);
//!
//! let summary = Migration::new(client, config).run()?;
//! println!("{} objects committed", summary.committed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod migrate;
pub mod remote;
pub mod storage;

// Re-export commonly used types
pub use core::{
    error::{OcflError, Result},
    types::{ContentDigest, FileEntry, ObjectId, User, Version, VersionedObject},
};

pub use config::{Credentials, ExplicitCredentials, MigrateConfig};

pub use migrate::{Dispatcher, Migration, ObjectExporter, RunSummary};

pub use remote::{PreservicaClient, RepositoryClient};

pub use storage::{ArchiveUnpacker, StorageLayout, StorageRoot, TruncatedNTupleLayout};

/// Current version of preservica-ocfl
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
