//! Storage root bootstrap
//!
//! Runs once, single-threaded, before any object work. Rerunning against an
//! initialised root is harmless as long as the configured depth matches the
//! depth the root was created with.

use crate::core::error::{OcflError, Result};
use crate::storage::layout::StorageLayout;
use crate::storage::root::{namaste_content, StorageRoot, EXTENSIONS_DIR, ROOT_LAYOUT, ROOT_NAMASTE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Human-readable copy of the specification, kept at the root
pub const SPEC_COPY: &str = "ocfl_1.1.html";
/// Where the specification copy is fetched from
pub const SPEC_URL: &str = "https://ocfl.io/1.1/spec/";

/// `ocfl_layout.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDeclaration {
    pub extension: String,
    pub description: String,
}

/// `extensions/<extension>/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub extension_name: String,
    pub depth: usize,
}

/// Something that can provide the specification text
pub trait SpecSource {
    fn fetch(&self) -> Result<Vec<u8>>;
}

/// Fetches the specification over HTTP
#[derive(Debug, Clone)]
pub struct HttpSpecSource {
    url: String,
}

impl HttpSpecSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for HttpSpecSource {
    fn default() -> Self {
        Self::new(SPEC_URL)
    }
}

impl SpecSource for HttpSpecSource {
    fn fetch(&self) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("preservica-ocfl/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| OcflError::network(format!("Failed to create HTTP client: {}", e)))?;

        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| OcflError::network(format!("Failed to fetch {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(OcflError::network(format!(
                "{} returned status: {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| OcflError::network(format!("Failed to read {}: {}", self.url, e)))?;
        Ok(body.to_vec())
    }
}

/// What bootstrap did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// The root marker was written by this run
    pub created: bool,
    pub spec_copy_written: bool,
}

/// Initialise (or re-validate) a storage root
pub fn bootstrap(
    storage: &StorageRoot,
    spec_source: Option<&dyn SpecSource>,
) -> Result<BootstrapReport> {
    let root = storage.root();
    let layout = storage.layout();
    let mut report = BootstrapReport::default();

    if storage.is_initialized() {
        if let Some(existing) = recorded_depth(storage)? {
            if existing != layout.depth() {
                return Err(OcflError::LayoutMismatch {
                    path: root.to_path_buf(),
                    existing,
                    requested: layout.depth(),
                });
            }
        }
    } else {
        if root.exists() && fs::read_dir(root)?.next().is_some() {
            return Err(OcflError::bootstrap(format!(
                "{} is not empty and is not an OCFL storage root",
                root.display()
            )));
        }
        fs::create_dir_all(root)
            .map_err(|e| OcflError::bootstrap(format!("cannot create {}: {}", root.display(), e)))?;
        storage.write(ROOT_NAMASTE, namaste_content(ROOT_NAMASTE).as_bytes())?;
        report.created = true;
        info!(root = %root.display(), "created OCFL storage root");
    }

    let declaration = LayoutDeclaration {
        extension: layout.extension().to_string(),
        description: layout.description().to_string(),
    };
    storage.write(ROOT_LAYOUT, &serde_json::to_vec_pretty(&declaration)?)?;

    let config = LayoutConfig {
        extension_name: layout.extension().to_string(),
        depth: layout.depth(),
    };
    storage.write(
        &layout_config_name(layout.extension()),
        &serde_json::to_vec_pretty(&config)?,
    )?;

    fs::create_dir_all(storage.workspace())?;

    if let Some(source) = spec_source {
        if !root.join(SPEC_COPY).exists() {
            match source.fetch() {
                Ok(bytes) => {
                    storage.write(SPEC_COPY, &bytes)?;
                    report.spec_copy_written = true;
                }
                Err(e) => warn!(error = %e, "could not fetch the OCFL specification copy"),
            }
        }
    }

    Ok(report)
}

/// Depth recorded in the root's layout configuration, if any
pub fn recorded_depth(storage: &StorageRoot) -> Result<Option<usize>> {
    let path = storage
        .root()
        .join(layout_config_name(storage.layout().extension()));
    if !path.exists() {
        return Ok(None);
    }
    let config: LayoutConfig = serde_json::from_slice(&fs::read(&path)?)?;
    Ok(Some(config.depth))
}

fn layout_config_name(extension: &str) -> String {
    PathBuf::from(EXTENSIONS_DIR)
        .join(extension)
        .join("config.json")
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::layout::TruncatedNTupleLayout;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct FixedSpec {
        calls: Cell<usize>,
        fail: bool,
    }

    impl SpecSource for FixedSpec {
        fn fetch(&self) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(OcflError::network("offline"))
            } else {
                Ok(b"<html>OCFL 1.1</html>".to_vec())
            }
        }
    }

    fn storage(temp: &TempDir, depth: usize) -> StorageRoot {
        StorageRoot::new(
            temp.path().join("root"),
            TruncatedNTupleLayout::new(depth).unwrap(),
        )
    }

    #[test]
    fn test_bootstrap_writes_declarations() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage(&temp, 2);
        let spec = FixedSpec { calls: Cell::new(0), fail: false };

        let report = bootstrap(&storage, Some(&spec))?;

        assert!(report.created);
        assert!(report.spec_copy_written);
        assert_eq!(fs::read_to_string(storage.root().join(ROOT_NAMASTE))?, "ocfl_1.1\n");
        let declaration: LayoutDeclaration =
            serde_json::from_slice(&fs::read(storage.root().join(ROOT_LAYOUT))?)?;
        assert_eq!(declaration.extension, storage.layout().extension());
        assert_eq!(recorded_depth(&storage)?, Some(2));
        assert!(storage.workspace().is_dir());
        Ok(())
    }

    #[test]
    fn test_bootstrap_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage(&temp, 3);
        let spec = FixedSpec { calls: Cell::new(0), fail: false };

        bootstrap(&storage, Some(&spec))?;
        let before = fs::read(storage.root().join(ROOT_LAYOUT))?;
        let report = bootstrap(&storage, Some(&spec))?;

        assert!(!report.created);
        assert!(!report.spec_copy_written);
        assert_eq!(spec.calls.get(), 1);
        assert_eq!(fs::read(storage.root().join(ROOT_LAYOUT))?, before);
        Ok(())
    }

    #[test]
    fn test_depth_change_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        bootstrap(&storage(&temp, 2), None)?;
        let err = bootstrap(&storage(&temp, 4), None).unwrap_err();
        assert!(matches!(
            err,
            OcflError::LayoutMismatch { existing: 2, requested: 4, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_specification_fetch_failure_is_not_fatal() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage(&temp, 2);
        let spec = FixedSpec { calls: Cell::new(0), fail: true };

        let report = bootstrap(&storage, Some(&spec))?;

        assert!(report.created);
        assert!(!report.spec_copy_written);
        assert!(!storage.root().join(SPEC_COPY).exists());
        Ok(())
    }

    #[test]
    fn test_non_empty_directory_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage(&temp, 2);
        fs::create_dir_all(storage.root())?;
        fs::write(storage.root().join("stray.txt"), "x")?;
        assert!(matches!(bootstrap(&storage, None), Err(OcflError::Bootstrap { .. })));
        Ok(())
    }
}
