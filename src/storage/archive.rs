//! Export package unpacking
//!
//! An OPEX export arrives as a zip archive. Without the parent hierarchy it
//! holds, per asset, a package descriptor (`*.pax.zip.opex`) next to a nested
//! package (`*.pax.zip`) whose own entries are the files to store. With the
//! parent hierarchy included, every file in the archive is stored verbatim.
//!
//! Digests are always computed over the bytes actually read; nothing is
//! taken from archive metadata.

use crate::core::error::{OcflError, Result};
use crate::core::types::FileEntry;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Suffix of the OPEX descriptor that accompanies a nested package
pub const DESCRIPTOR_SUFFIX: &str = ".pax.zip.opex";

/// Suffix of a nested package archive
pub const PACKAGE_SUFFIX: &str = "pax.zip";

/// How the top level of an export archive is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnpackMode {
    /// Descriptors stored verbatim, nested packages expanded
    #[default]
    Packages,
    /// Every non-directory entry stored verbatim
    IncludeParentFolders,
}

impl UnpackMode {
    pub fn from_parent_hierarchy(include_parent_hierarchy: bool) -> Self {
        if include_parent_hierarchy {
            UnpackMode::IncludeParentFolders
        } else {
            UnpackMode::Packages
        }
    }
}

/// Turns a downloaded export archive into the files of one version
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveUnpacker {
    mode: UnpackMode,
}

impl ArchiveUnpacker {
    pub fn new(mode: UnpackMode) -> Self {
        Self { mode }
    }

    /// Unpack an archive on disk
    pub fn unpack_file(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let file = File::open(path)?;
        self.unpack(BufReader::new(file))
    }

    /// Unpack an archive from any seekable reader. Entries come back in
    /// archive order.
    pub fn unpack<R: Read + Seek>(&self, reader: R) -> Result<Vec<FileEntry>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| OcflError::archive_unreadable(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());

        match self.mode {
            UnpackMode::IncludeParentFolders => {
                read_all_files(&mut archive, &mut entries)?;
            }
            UnpackMode::Packages => {
                for index in 0..archive.len() {
                    let mut entry = archive.by_index(index)?;
                    let name = entry.name().to_string();

                    if name.ends_with(DESCRIPTOR_SUFFIX) {
                        let content = read_entry(&mut entry)?;
                        entries.push(FileEntry::new(checked_path(&name)?, content));
                    } else if name.ends_with(PACKAGE_SUFFIX) {
                        let content = read_entry(&mut entry)?;
                        let mut inner = ZipArchive::new(Cursor::new(content)).map_err(|e| {
                            OcflError::malformed_archive(format!(
                                "nested package {} could not be opened: {}",
                                name, e
                            ))
                        })?;
                        read_all_files(&mut inner, &mut entries)?;
                    } else {
                        return Err(OcflError::unexpected_entry(name));
                    }
                }
            }
        }

        Ok(entries)
    }
}

/// Read every non-directory entry of `archive` into `out`
fn read_all_files<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    out: &mut Vec<FileEntry>,
) -> Result<()> {
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let content = read_entry(&mut entry)?;
        out.push(FileEntry::new(checked_path(&name)?, content));
    }
    Ok(())
}

fn read_entry<R: Read>(entry: &mut R) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(content)
}

/// Logical paths must stay inside the version's content directory
fn checked_path(name: &str) -> Result<String> {
    let escapes = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || name
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if escapes {
        return Err(OcflError::InvalidLogicalPath {
            path: name.to_string(),
        });
    }
    Ok(name.to_string())
}
