//! Core data types for the OCFL export pipeline

use crate::core::error::{OcflError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default message recorded on the first (and only) exported version
pub const DEFAULT_VERSION_MESSAGE: &str = "Initial Export";

/// Identifier of one logical asset, shared by the remote repository and the
/// OCFL object that mirrors it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Parse an identifier, rejecting anything that is not a well-formed UUID
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(ObjectId)
            .map_err(|_| OcflError::invalid_identifier(s))
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        ObjectId(uuid)
    }

    /// Generate a random identifier (used by tests and fixtures)
    pub fn new_v4() -> Self {
        ObjectId(Uuid::new_v4())
    }

    /// Leading 32 bits of the UUID (the `time_low` field)
    pub fn leading_u32(&self) -> u32 {
        self.0.as_fields().0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0.hyphenated())
    }
}

impl FromStr for ObjectId {
    type Err = OcflError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// 64-byte SHA-512 content digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 64]);

impl ContentDigest {
    /// Create a digest from raw bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        ContentDigest(bytes)
    }

    /// Create a digest from a hex string
    pub fn from_hex(hex: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut array = [0u8; 64];
        array.copy_from_slice(&bytes);
        Ok(ContentDigest(array))
    }

    /// Lower-case hex rendering, as used in OCFL inventories
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &hex::encode(self.0)[..12])
    }
}

impl Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        ContentDigest::from_hex(&hex_string).map_err(serde::de::Error::custom)
    }
}

/// One file belonging to a version
#[derive(Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Logical path of the file inside the version
    pub path: String,
    /// Full file content
    pub content: Vec<u8>,
    /// Digest computed over `content`
    pub digest: ContentDigest,
}

impl FileEntry {
    /// Build an entry, computing the digest over the supplied bytes
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        let digest = crate::core::hash::sha512(&content);
        Self {
            path: path.into(),
            content,
            digest,
        }
    }

    /// Size of the content in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .field("size", &self.content.len())
            .field("digest", &self.digest)
            .finish()
    }
}

/// Attribution of a version: who made it and from which system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Originating system, e.g. `"eu.preservica.com (tenant)"`
    pub name: String,
    /// Actor address, e.g. the remote account username
    pub address: String,
}

/// One timestamped, attributed snapshot of an object's file set
#[derive(Debug, Clone)]
pub struct Version {
    pub created: DateTime<Utc>,
    pub user: User,
    pub message: String,
    files: Vec<FileEntry>,
    paths: HashSet<String>,
}

impl Version {
    /// Create an empty version
    pub fn new(created: DateTime<Utc>, user: User, message: impl Into<String>) -> Self {
        Self {
            created,
            user,
            message: message.into(),
            files: Vec::new(),
            paths: HashSet::new(),
        }
    }

    /// Add a file. Logical paths are unique within a version.
    pub fn add_file(&mut self, entry: FileEntry) -> Result<()> {
        if !self.paths.insert(entry.path.clone()) {
            return Err(OcflError::DuplicatePath { path: entry.path });
        }
        self.files.push(entry);
        Ok(())
    }

    /// Add every file from an iterator, stopping at the first duplicate
    pub fn extend_files<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = FileEntry>,
    {
        for entry in entries {
            self.add_file(entry)?;
        }
        Ok(())
    }

    /// Files in insertion order
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// ISO-8601 creation time as written to inventories
    pub fn created_rfc3339(&self) -> String {
        self.created.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// An object ready to be committed: an identifier plus ordered versions
#[derive(Debug, Clone)]
pub struct VersionedObject {
    pub id: ObjectId,
    pub versions: Vec<Version>,
}

impl VersionedObject {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            versions: Vec::new(),
        }
    }

    /// Append a version; the first becomes `v1`
    pub fn push_version(&mut self, version: Version) {
        self.versions.push(version);
    }

    /// Name of the newest version (`v1`, `v2`, ...)
    pub fn head(&self) -> Option<String> {
        if self.versions.is_empty() {
            None
        } else {
            Some(version_name(self.versions.len()))
        }
    }
}

/// OCFL version directory name for a 1-based version number
pub fn version_name(number: usize) -> String {
    format!("v{}", number)
}
