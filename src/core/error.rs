//! Error types for the OCFL export pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for export operations
#[derive(Error, Debug)]
pub enum OcflError {
    /// Identifier errors
    #[error("Invalid identifier: {id}")]
    InvalidIdentifier { id: String },

    #[error("Invalid layout depth {depth}: must be between 1 and 4")]
    InvalidDepth { depth: usize },

    /// Archive errors
    #[error("Unexpected entry in export package: {name}")]
    UnexpectedArchiveEntry { name: String },

    #[error("Malformed export archive: {reason}")]
    MalformedArchive { reason: String },

    #[error("Export archive could not be read: {reason}")]
    ArchiveUnreadable { reason: String },

    #[error("Invalid logical path in export package: {path}")]
    InvalidLogicalPath { path: String },

    #[error("Duplicate logical path in version: {path}")]
    DuplicatePath { path: String },

    /// Storage root errors
    #[error("Storage root not initialized: {path}")]
    RootNotInitialized { path: PathBuf },

    #[error("Storage root at {path} uses layout depth {existing}, requested {requested}")]
    LayoutMismatch {
        path: PathBuf,
        existing: usize,
        requested: usize,
    },

    #[error("Object already exists: {id}")]
    ObjectAlreadyExists { id: String },

    #[error("Object has no versions: {id}")]
    EmptyObject { id: String },

    #[error("Bootstrap failed: {reason}")]
    Bootstrap { reason: String },

    /// Remote repository errors
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Remote repository error: {reason}")]
    Remote { reason: String },

    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    #[error("Discovery failed: {reason}")]
    Discovery { reason: String },

    #[error("Export failed for {id}: {reason}")]
    ExportFailed { id: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error for unexpected conditions
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OcflError {
    /// Create a new invalid identifier error
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    /// Create a new unexpected archive entry error
    pub fn unexpected_entry(name: impl Into<String>) -> Self {
        Self::UnexpectedArchiveEntry { name: name.into() }
    }

    /// Create a new malformed archive error
    pub fn malformed_archive(reason: impl Into<String>) -> Self {
        Self::MalformedArchive {
            reason: reason.into(),
        }
    }

    /// Create a new unreadable archive error
    pub fn archive_unreadable(reason: impl Into<String>) -> Self {
        Self::ArchiveUnreadable {
            reason: reason.into(),
        }
    }

    /// Create a new bootstrap error
    pub fn bootstrap(reason: impl Into<String>) -> Self {
        Self::Bootstrap {
            reason: reason.into(),
        }
    }

    /// Create a new remote repository error
    pub fn remote(reason: impl Into<String>) -> Self {
        Self::Remote {
            reason: reason.into(),
        }
    }

    /// Create a new network error
    pub fn network(reason: impl Into<String>) -> Self {
        Self::NetworkError {
            reason: reason.into(),
        }
    }

    /// Create a new discovery error
    pub fn discovery(reason: impl Into<String>) -> Self {
        Self::Discovery {
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::ConfigurationError {
            reason: reason.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the export package is not shaped the way the export
    /// workflow promises. A download that is not a readable zip at all
    /// is damaged in transit, not misshapen, and is excluded.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedArchiveEntry { .. }
                | Self::MalformedArchive { .. }
                | Self::InvalidLogicalPath { .. }
                | Self::DuplicatePath { .. }
        )
    }
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, OcflError>;
