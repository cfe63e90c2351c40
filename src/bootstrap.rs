//! The bootstrap pipeline: patch bundle in, live device out.
//!
//! The pipeline is strictly sequential and has no retries. Descriptor
//! loading, runtime provisioning and device construction are fatal;
//! dependency resolution is optional and quietly defaults to empty. There
//! is no partial-device state: either every step completes and the device
//! is connected to the output stage, or bootstrap aborts with nothing
//! built.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::info;
use rtrb::Consumer;
use thiserror::Error;

use crate::assets;
use crate::device::{AudioConfig, Device, DeviceError, ParamChange};
use crate::patch::{PatchError, PatchSource, PresetEntry};
use crate::runtime::{ProvisionError, RuntimeProvisioner};

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The descriptor was absent. Carries the configured load path as a
    /// hint, since a wrong bundle path is the common cause.
    #[error("no patch descriptor at {path} — check the bundle path")]
    DescriptorMissing {
        path: PathBuf,
        #[source]
        source: PatchError,
    },
    #[error("failed to load patch descriptor")]
    Descriptor(#[source] PatchError),
    #[error("runtime provisioning failed")]
    Provision(#[from] ProvisionError),
    #[error("device construction failed")]
    Device(#[from] DeviceError),
}

/// What gets handed to an external status sink on bootstrap completion.
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    pub error: String,
    pub header: Option<String>,
    pub description: Option<String>,
}

impl FailureReport {
    fn from_error(err: &BootstrapError) -> Self {
        let (header, description) = match err {
            BootstrapError::DescriptorMissing { path, .. } => (
                Some("Patch bundle not found".to_owned()),
                Some(format!("expected a descriptor at {}", path.display())),
            ),
            _ => (None, None),
        };
        Self { error: err.to_string(), header, description }
    }
}

/// Optional status-reporting capability.
///
/// `failed` fires once per fatal bootstrap error (which still propagates to
/// the caller); `ready` fires once on full success.
pub trait StatusReporter {
    fn failed(&mut self, report: FailureReport);
    fn ready(&mut self);
}

/// Default reporter: does nothing.
pub struct NoopReporter;

impl StatusReporter for NoopReporter {
    fn failed(&mut self, _report: FailureReport) {}
    fn ready(&mut self) {}
}

/// The shared output node the device connects into. The host's audio
/// callback pulls mono blocks from here and owns channel fanout.
pub struct OutputStage {
    device: Option<Arc<Mutex<Device>>>,
    master_gain: f32,
}

impl OutputStage {
    pub fn new() -> Self {
        Self { device: None, master_gain: 1.0 }
    }

    pub fn connect(&mut self, device: Arc<Mutex<Device>>) {
        self.device = Some(device);
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    /// Render one mono block. Silence until a device is connected.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if let Some(device) = &self.device {
            if let Ok(mut device) = device.lock() {
                device.render_block(out);
            }
        }
        if self.master_gain != 1.0 {
            for sample in out.iter_mut() {
                *sample *= self.master_gain;
            }
        }
    }
}

impl Default for OutputStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Idempotent deferred activation of the audio output path.
///
/// Audio backends commonly start suspended; the host arms this latch at
/// bootstrap and fires it on the first user interaction. Repeat fires are
/// no-ops.
pub struct ResumeLatch {
    fired: bool,
    action: Box<dyn FnMut()>,
}

impl ResumeLatch {
    pub fn new(action: impl FnMut() + 'static) -> Self {
        Self { fired: false, action: Box::new(action) }
    }

    pub fn fire(&mut self) {
        if !self.fired {
            (self.action)();
            self.fired = true;
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Everything a successful bootstrap hands to the control surface.
pub struct LiveRig {
    pub device: Arc<Mutex<Device>>,
    /// Consumer half of the device's parameter-change channel.
    pub changes: Consumer<ParamChange>,
    pub presets: Vec<PresetEntry>,
    pub patch_name: String,
}

impl std::fmt::Debug for LiveRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveRig")
            .field("presets", &self.presets)
            .field("patch_name", &self.patch_name)
            .finish_non_exhaustive()
    }
}

pub struct Bootstrapper<'a> {
    source: &'a dyn PatchSource,
    provisioner: RuntimeProvisioner,
    reporter: Box<dyn StatusReporter>,
}

impl<'a> Bootstrapper<'a> {
    /// Bootstrapper over a source, with the builtin runtime and no status
    /// reporting.
    pub fn new(source: &'a dyn PatchSource) -> Self {
        Self {
            source,
            provisioner: RuntimeProvisioner::builtin(),
            reporter: Box::new(NoopReporter),
        }
    }

    pub fn with_provisioner(mut self, provisioner: RuntimeProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the pipeline and connect the device into `output`.
    pub fn run(
        mut self,
        config: &AudioConfig,
        output: &mut OutputStage,
    ) -> Result<LiveRig, BootstrapError> {
        match self.try_run(config, output) {
            Ok(rig) => {
                self.reporter.ready();
                Ok(rig)
            }
            Err(err) => {
                self.reporter.failed(FailureReport::from_error(&err));
                Err(err)
            }
        }
    }

    fn try_run(
        &mut self,
        config: &AudioConfig,
        output: &mut OutputStage,
    ) -> Result<LiveRig, BootstrapError> {
        let descriptor = self.source.load_descriptor().map_err(|err| {
            if err.is_missing() {
                BootstrapError::DescriptorMissing {
                    path: self.source.descriptor_path(),
                    source: err,
                }
            } else {
                BootstrapError::Descriptor(err)
            }
        })?;
        info!("loaded patch `{}`", descriptor.meta.name);

        let runtime = self.provisioner.ensure(&descriptor.meta.runtime_version)?;

        let dependencies = assets::resolve_manifest(self.source);
        info!("resolved {} data-buffer dependencies", dependencies.len());

        let mut device = runtime.create_device(config, &descriptor)?;
        info!("device up with {} parameters", device.num_parameters());

        if !dependencies.is_empty() {
            device.load_data_buffers(&dependencies);
        }

        let changes = device
            .take_change_rx()
            .expect("freshly constructed device owns its change channel");

        let device = Arc::new(Mutex::new(device));
        output.connect(Arc::clone(&device));

        Ok(LiveRig {
            device,
            changes,
            presets: descriptor.presets,
            patch_name: descriptor.meta.name,
        })
    }
}
