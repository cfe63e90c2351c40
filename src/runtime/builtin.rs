//! The built-in runtime: a compact drone voice.
//!
//! Real deployments implement [`AudioRuntime`] around their own processing
//! structure; this one exists so the host binary makes sound and so tests
//! can construct devices without hardware. It wires the well-known
//! parameter ids `frequency`, `gain` and `cutoff` onto the voice and treats
//! every other parameter as host-visible but acoustically inert.

use std::f32::consts::TAU;
use std::sync::Arc;

use crate::device::{AudioConfig, Device, DeviceDsp, DeviceError};
use crate::patch::{ParameterSpec, PatchDescriptor};

use super::{AudioRuntime, ProvisionError, RuntimeLoader, RuntimeVersion};

pub struct BuiltinLoader;

impl RuntimeLoader for BuiltinLoader {
    fn load(&self, version: &RuntimeVersion) -> Result<Arc<dyn AudioRuntime>, ProvisionError> {
        Ok(Arc::new(BuiltinRuntime { version: version.clone() }))
    }
}

pub struct BuiltinRuntime {
    version: RuntimeVersion,
}

impl AudioRuntime for BuiltinRuntime {
    fn version(&self) -> &RuntimeVersion {
        &self.version
    }

    fn create_device(
        &self,
        config: &AudioConfig,
        patch: &PatchDescriptor,
    ) -> Result<Device, DeviceError> {
        let dsp = DroneDsp::new(config.sample_rate, &patch.parameters);
        Device::new(config, &patch.parameters, Box::new(dsp))
    }
}

/// Indices of the parameters the voice responds to.
struct Wiring {
    frequency: Option<usize>,
    gain: Option<usize>,
    cutoff: Option<usize>,
}

impl Wiring {
    fn resolve(specs: &[ParameterSpec]) -> Self {
        let find = |id: &str| specs.iter().position(|s| s.id == id);
        Self {
            frequency: find("frequency"),
            gain: find("gain"),
            cutoff: find("cutoff"),
        }
    }
}

/// Sine drone through a one-pole lowpass, with per-sample gain smoothing to
/// keep parameter writes click-free.
struct DroneDsp {
    sample_rate: f32,
    wiring: Wiring,
    phase: f32,
    phase_inc: f32,
    gain_target: f32,
    gain: f32,
    lp_coeff: f32,
    lp_state: f32,
}

impl DroneDsp {
    fn new(sample_rate: f32, specs: &[ParameterSpec]) -> Self {
        let wiring = Wiring::resolve(specs);
        // Audible defaults for patches that wire nothing
        let mut dsp = Self {
            sample_rate,
            wiring,
            phase: 0.0,
            phase_inc: 0.0,
            gain_target: 0.2,
            gain: 0.0,
            lp_coeff: 1.0,
            lp_state: 0.0,
        };
        dsp.set_frequency(110.0);
        dsp.set_cutoff(sample_rate * 0.45);
        dsp
    }

    fn set_frequency(&mut self, freq: f32) {
        self.phase_inc = TAU * freq.max(0.0) / self.sample_rate;
    }

    fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = cutoff.clamp(1.0, self.sample_rate * 0.49);
        self.lp_coeff = 1.0 - (-TAU * cutoff / self.sample_rate).exp();
    }
}

impl DeviceDsp for DroneDsp {
    fn param_changed(&mut self, index: usize, value: f64) {
        let value = value as f32;
        if self.wiring.frequency == Some(index) {
            self.set_frequency(value);
        } else if self.wiring.gain == Some(index) {
            self.gain_target = value.clamp(0.0, 1.0);
        } else if self.wiring.cutoff == Some(index) {
            self.set_cutoff(value);
        }
    }

    fn render_block(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let raw = self.phase.sin();
            self.phase += self.phase_inc;
            if self.phase > TAU {
                self.phase -= TAU;
            }

            self.lp_state += self.lp_coeff * (raw - self.lp_state);

            // ~1ms smoothing toward the target gain
            self.gain += (self.gain_target - self.gain) * 0.005;
            *sample = self.lp_state * self.gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, min: f64, max: f64, initial: Option<f64>) -> ParameterSpec {
        ParameterSpec {
            id: id.to_owned(),
            name: None,
            min,
            max,
            steps: None,
            initial,
            tag: None,
        }
    }

    fn patch(params: Vec<ParameterSpec>) -> PatchDescriptor {
        PatchDescriptor {
            meta: crate::patch::PatchMeta {
                name: "test".to_owned(),
                runtime_version: "1.0.0".to_owned(),
            },
            parameters: params,
            presets: Vec::new(),
        }
    }

    #[test]
    fn device_renders_audible_bounded_output() {
        let runtime = BuiltinRuntime { version: RuntimeVersion::parse("1.0.0").unwrap() };
        let config = AudioConfig { sample_rate: 48_000.0 };
        let patch = patch(vec![
            spec("frequency", 20.0, 2_000.0, Some(220.0)),
            spec("gain", 0.0, 1.0, Some(0.8)),
        ]);

        let mut device = runtime.create_device(&config, &patch).unwrap();
        let mut block = vec![0.0f32; 4_096];
        device.render_block(&mut block);

        assert!(block.iter().any(|s| s.abs() > 0.01));
        assert!(block.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn unwired_parameters_are_inert_but_visible() {
        let runtime = BuiltinRuntime { version: RuntimeVersion::parse("1.0.0").unwrap() };
        let patch = patch(vec![spec("shimmer", 0.0, 1.0, None)]);
        let mut device = runtime
            .create_device(&AudioConfig::default(), &patch)
            .unwrap();

        assert_eq!(device.num_parameters(), 1);
        device.set_param(0, 0.7); // must not panic or detune anything
    }
}
