//! Where patch bundles come from.
//!
//! The bootstrapper only talks to [`PatchSource`], so tests can inject
//! sources that fail in controlled ways. [`DirSource`] is the production
//! implementation: a bundle directory on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{ManifestEntry, PatchDescriptor, DESCRIPTOR_FILE, MANIFEST_FILE, ASSET_DIR};

/// Failure loading part of a patch bundle.
///
/// `Missing` is kept separate from `Io`/`Parse` because the bootstrapper
/// annotates missing descriptors with a load-path hint and nothing else.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("no such resource: {path}")]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PatchError {
    /// True for the missing-resource case (the filesystem analog of a
    /// non-2xx fetch).
    pub fn is_missing(&self) -> bool {
        matches!(self, PatchError::Missing { .. })
    }
}

/// Provider of the three bundle resources.
pub trait PatchSource {
    /// Path the descriptor is expected at, used for failure hints.
    fn descriptor_path(&self) -> PathBuf;

    fn load_descriptor(&self) -> Result<PatchDescriptor, PatchError>;

    fn load_manifest(&self) -> Result<Vec<ManifestEntry>, PatchError>;

    /// Directory manifest file references resolve against.
    fn asset_dir(&self) -> PathBuf;
}

/// A patch bundle directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PatchSource for DirSource {
    fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE)
    }

    fn load_descriptor(&self) -> Result<PatchDescriptor, PatchError> {
        read_json(&self.descriptor_path())
    }

    fn load_manifest(&self) -> Result<Vec<ManifestEntry>, PatchError> {
        read_json(&self.root.join(MANIFEST_FILE))
    }

    fn asset_dir(&self) -> PathBuf {
        self.root.join(ASSET_DIR)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PatchError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PatchError::Missing { path: path.to_path_buf(), source }
        } else {
            PatchError::Io { path: path.to_path_buf(), source }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| PatchError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_descriptor_is_classified() {
        let source = DirSource::new("/definitely/not/a/bundle");
        let err = source.load_descriptor().unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn malformed_descriptor_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DESCRIPTOR_FILE), "{ not json").unwrap();
        let err = DirSource::new(dir.path()).load_descriptor().unwrap_err();
        assert!(matches!(err, PatchError::Parse { .. }));
        assert!(!err.is_missing());
    }
}
