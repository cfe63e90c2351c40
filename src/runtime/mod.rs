//! Runtime provisioning.
//!
//! The processing runtime is a capability resolved by version, loaded at
//! most once per host lifetime. Debug-tagged builds are not distributable
//! and are rejected before the loader is ever consulted.

mod builtin;

pub use builtin::{BuiltinLoader, BuiltinRuntime};

use std::fmt;
use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::device::{AudioConfig, Device, DeviceError};
use crate::patch::PatchDescriptor;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("`{0}` is not a valid runtime version")]
    InvalidVersion(String),
    #[error("debug builds of the runtime are not distributable (got `{0}`)")]
    DebugBuild(String),
    #[error("runtime {0} is not available")]
    Unavailable(RuntimeVersion),
}

/// A parsed runtime version: three numeric components plus an optional
/// pre-release suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre: Option<String>,
}

impl RuntimeVersion {
    pub fn parse(text: &str) -> Result<Self, ProvisionError> {
        let bad = || ProvisionError::InvalidVersion(text.to_owned());
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_owned())),
            Some(_) => return Err(bad()),
            None => (text, None),
        };
        let mut parts = core.split('.');
        let mut component = || {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| bad())
        };
        let (major, minor, patch) = (component()?, component()?, component()?);
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(Self { major, minor, patch, pre })
    }

    /// True for debug build markers (`-dev` suffix).
    pub fn is_debug(&self) -> bool {
        self.pre.as_deref() == Some("dev")
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// The audio-processing capability, once provisioned.
pub trait AudioRuntime: Send + Sync {
    fn version(&self) -> &RuntimeVersion;

    fn create_device(
        &self,
        config: &AudioConfig,
        patch: &PatchDescriptor,
    ) -> Result<Device, DeviceError>;
}

impl fmt::Debug for dyn AudioRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioRuntime")
            .field("version", self.version())
            .finish_non_exhaustive()
    }
}

/// Resolves a validated version into a runtime instance.
pub trait RuntimeLoader {
    fn load(&self, version: &RuntimeVersion) -> Result<Arc<dyn AudioRuntime>, ProvisionError>;
}

/// Guarantees the runtime is loaded exactly once.
///
/// Bootstrap is cooperative and sequential, so a plain cached `Option` is
/// the whole single-in-flight story.
pub struct RuntimeProvisioner {
    loaded: Option<Arc<dyn AudioRuntime>>,
    loader: Box<dyn RuntimeLoader>,
}

impl RuntimeProvisioner {
    pub fn new(loader: Box<dyn RuntimeLoader>) -> Self {
        Self { loaded: None, loader }
    }

    /// Provisioner backed by the built-in runtime.
    pub fn builtin() -> Self {
        Self::new(Box::new(BuiltinLoader))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Ensure a runtime for `version` is available.
    ///
    /// No-op when one is already loaded. Otherwise the version is validated
    /// (debug builds rejected here, before the loader runs) and the loader
    /// is invoked once.
    pub fn ensure(&mut self, version: &str) -> Result<Arc<dyn AudioRuntime>, ProvisionError> {
        if let Some(runtime) = &self.loaded {
            return Ok(Arc::clone(runtime));
        }
        let parsed = RuntimeVersion::parse(version)?;
        if parsed.is_debug() {
            return Err(ProvisionError::DebugBuild(version.to_owned()));
        }
        let runtime = self.loader.load(&parsed)?;
        info!("runtime {parsed} loaded");
        self.loaded = Some(Arc::clone(&runtime));
        Ok(runtime)
    }
}
