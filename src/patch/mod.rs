//! Data model for a patch bundle.
//!
//! A bundle is a directory holding the descriptor (`patch.json`), an
//! optional data-buffer manifest (`dependencies.json`), and an `assets/`
//! directory the manifest's file references are resolved against. The
//! descriptor is immutable once loaded; the bootstrapper owns it until the
//! device has been constructed.

mod source;

pub use source::{DirSource, PatchError, PatchSource};

use serde::{Deserialize, Serialize};

/// Descriptor file name inside a bundle.
pub const DESCRIPTOR_FILE: &str = "patch.json";
/// Data-buffer manifest file name inside a bundle.
pub const MANIFEST_FILE: &str = "dependencies.json";
/// Directory the manifest's file references are rewritten into.
pub const ASSET_DIR: &str = "assets";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchDescriptor {
    pub meta: PatchMeta,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub presets: Vec<PresetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchMeta {
    #[serde(rename = "patchername")]
    pub name: String,
    #[serde(rename = "runtimeversion")]
    pub runtime_version: String,
}

/// One parameter definition from the descriptor.
///
/// `steps` above 1 quantizes the parameter onto a discrete grid; absent or
/// 1 means continuous. `tag` declares which presentation effect, if any,
/// gestures on this parameter drive (resolved once at bind time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub initial: Option<f64>,
    #[serde(default)]
    pub tag: Option<EffectTag>,
}

impl ParameterSpec {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Declared presentation-effect tag for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectTag {
    /// Toggles the glow theme flag when a gesture ends.
    Glow,
    /// Toggles the pulse theme flag when a gesture starts.
    Pulse,
}

/// A name-free preset slot wrapping an opaque payload.
///
/// The payload is handed verbatim to the device's preset-apply capability;
/// the host never inspects it beyond JSON parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetEntry {
    pub payload: serde_json::Value,
}

/// One raw manifest entry, before asset-path rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    #[serde(default)]
    pub file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parses_with_optional_sections_absent() {
        let json = r#"{
            "meta": { "patchername": "drone", "runtimeversion": "1.2.3" }
        }"#;
        let desc: PatchDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.meta.name, "drone");
        assert_eq!(desc.meta.runtime_version, "1.2.3");
        assert!(desc.parameters.is_empty());
        assert!(desc.presets.is_empty());
    }

    #[test]
    fn parameter_spec_parses_tags_and_steps() {
        let json = r#"{
            "id": "cutoff",
            "min": 20.0,
            "max": 20000.0,
            "steps": 128,
            "tag": "glow"
        }"#;
        let spec: ParameterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.display_name(), "cutoff");
        assert_eq!(spec.steps, Some(128));
        assert_eq!(spec.tag, Some(EffectTag::Glow));
    }
}
