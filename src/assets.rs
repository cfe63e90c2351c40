//! Data-buffer dependency resolution.
//!
//! The manifest is optional: a bundle with no manifest, or a manifest that
//! fails to load or parse, simply contributes no dependencies. Nothing in
//! bootstrap may fail because of it.

use std::path::PathBuf;

use log::debug;

use crate::patch::PatchSource;

/// One resolved dependency: an id the device knows the buffer by, plus the
/// rewritten asset path if the entry carried a file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub id: String,
    pub file: Option<PathBuf>,
}

/// Fetch and normalize the bundle's dependency manifest.
///
/// File references are rewritten into the source's asset directory; entries
/// without one pass through unchanged. Any failure yields an empty set.
pub fn resolve_manifest(source: &dyn PatchSource) -> Vec<DependencyEntry> {
    let entries = match source.load_manifest() {
        Ok(entries) => entries,
        Err(err) => {
            debug!("no dependency manifest: {err}");
            return Vec::new();
        }
    };

    let asset_dir = source.asset_dir();
    entries
        .into_iter()
        .map(|entry| DependencyEntry {
            id: entry.id,
            file: entry.file.map(|f| asset_dir.join(f)),
        })
        .collect()
}
