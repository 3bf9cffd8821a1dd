//! Storage layer
//!
//! This module handles the local side of the export: the OCFL storage root,
//! the layout that addresses objects inside it, inventories, and unpacking
//! of downloaded export packages.

pub mod archive;
pub mod bootstrap;
pub mod inventory;
pub mod layout;
pub mod root;

// Re-export commonly used items
pub use archive::{ArchiveUnpacker, UnpackMode};
pub use bootstrap::{bootstrap, HttpSpecSource, SpecSource};
pub use layout::{StorageLayout, TruncatedNTupleLayout};
pub use root::StorageRoot;
