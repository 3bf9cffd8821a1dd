//! Storage layout: where an object lives under the storage root
//!
//! The truncated n-tuple layout takes the first 32 bits of an object's UUID,
//! renders them as eight hex digits and uses `depth` two-digit pairs as
//! nested directories, ending in a directory named by the full identifier:
//!
//! ```text
//! depth 2:  9a/3f/9a3f0b12-0000-4000-8000-000000000001
//! depth 4:  9a/3f/0b/12/9a3f0b12-0000-4000-8000-000000000001
//! ```

use crate::core::error::{OcflError, Result};
use crate::core::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest supported depth
pub const MIN_DEPTH: usize = 1;
/// Largest supported depth (32 bits = four two-digit pairs)
pub const MAX_DEPTH: usize = 4;
/// Depth used when none is configured
pub const DEFAULT_DEPTH: usize = 2;

/// Extension name recorded in `ocfl_layout.json`
pub const LAYOUT_EXTENSION: &str = "preservica-truncated-ntuple-uuid";

/// Human-readable description recorded in `ocfl_layout.json`
pub const LAYOUT_DESCRIPTION: &str = concat!(
    "Object structure is a truncated n-tuple tree which uses 2 hex digits ",
    "for each level of the first (32 bits) part of the Preservica uuid",
);

/// Maps object identifiers to directories relative to the storage root
pub trait StorageLayout: Send + Sync {
    /// Relative directory of the object. Must be pure.
    fn path_for(&self, id: &ObjectId) -> PathBuf;

    /// Extension name declared in the root's layout descriptor
    fn extension(&self) -> &str;

    /// Description declared in the root's layout descriptor
    fn description(&self) -> &str;
}

/// Truncated n-tuple tree over the leading 32 bits of a UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedNTupleLayout {
    depth: usize,
}

impl TruncatedNTupleLayout {
    /// Create a layout, validating the depth
    pub fn new(depth: usize) -> Result<Self> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
            return Err(OcflError::InvalidDepth { depth });
        }
        Ok(Self { depth })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for TruncatedNTupleLayout {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

impl StorageLayout for TruncatedNTupleLayout {
    fn path_for(&self, id: &ObjectId) -> PathBuf {
        let prefix = format!("{:08x}", id.leading_u32());
        let mut path = PathBuf::new();
        for level in 0..self.depth {
            path.push(&prefix[level * 2..level * 2 + 2]);
        }
        path.push(id.to_string());
        path
    }

    fn extension(&self) -> &str {
        LAYOUT_EXTENSION
    }

    fn description(&self) -> &str {
        LAYOUT_DESCRIPTION
    }
}

/// Parse `id` and map it with a layout of the given depth
pub fn path_for(id: &str, depth: usize) -> Result<PathBuf> {
    let layout = TruncatedNTupleLayout::new(depth)?;
    let id = ObjectId::parse(id)?;
    Ok(layout.path_for(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::Path;

    const ID: &str = "9a3f0b12-0000-4000-8000-000000000001";

    #[test]
    fn test_depth_two() {
        let path = path_for(ID, 2).unwrap();
        assert_eq!(path, Path::new("9a").join("3f").join(ID));
    }

    #[test]
    fn test_every_depth() {
        assert_eq!(path_for(ID, 1).unwrap(), Path::new("9a").join(ID));
        assert_eq!(
            path_for(ID, 3).unwrap(),
            Path::new("9a").join("3f").join("0b").join(ID)
        );
        assert_eq!(
            path_for(ID, 4).unwrap(),
            Path::new("9a").join("3f").join("0b").join("12").join(ID)
        );
    }

    #[test]
    fn test_leading_zeros_are_kept() {
        let id = "0000ab12-1111-4000-8000-000000000002";
        assert_eq!(
            path_for(id, 4).unwrap(),
            Path::new("00").join("00").join("ab").join("12").join(id)
        );
    }

    #[test]
    fn test_uppercase_ids_are_normalised() {
        let upper = ID.to_uppercase();
        assert_eq!(path_for(&upper, 2).unwrap(), path_for(ID, 2).unwrap());
    }

    #[test]
    fn test_invalid_depth() {
        assert!(matches!(
            TruncatedNTupleLayout::new(0),
            Err(OcflError::InvalidDepth { depth: 0 })
        ));
        assert!(matches!(
            TruncatedNTupleLayout::new(5),
            Err(OcflError::InvalidDepth { depth: 5 })
        ));
    }

    #[test]
    fn test_invalid_identifier() {
        assert!(matches!(
            path_for("sdb:IO|not-a-uuid", 2),
            Err(OcflError::InvalidIdentifier { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_path_is_deterministic(bytes in any::<[u8; 16]>(), depth in 1usize..=4) {
            let id = ObjectId::from_uuid(uuid::Uuid::from_bytes(bytes));
            let layout = TruncatedNTupleLayout::new(depth).unwrap();
            prop_assert_eq!(layout.path_for(&id), layout.path_for(&id));
            prop_assert_eq!(layout.path_for(&id).components().count(), depth + 1);
        }

        #[test]
        fn prop_distinct_ids_get_distinct_paths(
            a in any::<[u8; 16]>(),
            b in any::<[u8; 16]>(),
            depth in 1usize..=4,
        ) {
            let layout = TruncatedNTupleLayout::new(depth).unwrap();
            let id_a = ObjectId::from_uuid(uuid::Uuid::from_bytes(a));
            let id_b = ObjectId::from_uuid(uuid::Uuid::from_bytes(b));
            prop_assert_eq!(layout.path_for(&id_a) == layout.path_for(&id_b), id_a == id_b);
        }

        #[test]
        fn prop_depths_do_not_overlap(
            bytes in any::<[u8; 16]>(),
            d1 in 1usize..=4,
            d2 in 1usize..=4,
        ) {
            prop_assume!(d1 != d2);
            let id = ObjectId::from_uuid(uuid::Uuid::from_bytes(bytes));
            let p1 = TruncatedNTupleLayout::new(d1).unwrap().path_for(&id);
            let p2 = TruncatedNTupleLayout::new(d2).unwrap().path_for(&id);
            prop_assert_ne!(&p1, &p2);
            prop_assert!(!p1.starts_with(&p2) && !p2.starts_with(&p1));
        }
    }
}
