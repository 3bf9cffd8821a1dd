//! Core types and utilities
//!
//! This module contains the fundamental data types, error handling,
//! and digest functions used throughout the pipeline.

pub mod error;
pub mod hash;
pub mod types;

// Re-export commonly used items
pub use error::{OcflError, Result};
pub use hash::sha512;
pub use types::{ContentDigest, FileEntry, ObjectId, User, Version, VersionedObject};
