//! The live device: an instantiated audio processing unit.
//!
//! The device owns the authoritative parameter values. UI writes go through
//! [`Device::set_param`], which clamps, quantizes, and echoes the accepted
//! value on the change channel; mirrors reconcile from that channel, never
//! the other way around. The processing structure behind the parameters is
//! opaque to the host ([`DeviceDsp`]), supplied by whichever runtime built
//! the device.

use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};
use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::assets::DependencyEntry;
use crate::patch::{EffectTag, ParameterSpec};

/// Capacity of the parameter-change channel. Changes beyond this between
/// two UI polls are dropped; the next reconciliation catches up.
const CHANGE_QUEUE_CAP: usize = 1024;

/// Audio context the device renders under.
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    pub sample_rate: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { sample_rate: 48_000.0 }
    }
}

/// Device construction failure. Terminal for bootstrap.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("parameter `{id}` has invalid bounds ({min} > {max})")]
    InvalidBounds { id: String, min: f64, max: f64 },
    #[error("duplicate parameter id `{0}`")]
    DuplicateParam(String),
}

/// A named, bounded, live-tunable control surface on the device.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub steps: Option<u32>,
    /// Declared presentation-effect tag, carried through for the binding
    /// layer to resolve.
    pub tag: Option<EffectTag>,
    value: f64,
}

impl Parameter {
    fn from_spec(spec: &ParameterSpec) -> Self {
        let initial = spec.initial.unwrap_or(spec.min);
        let mut param = Self {
            id: spec.id.clone(),
            name: spec.display_name().to_owned(),
            min: spec.min,
            max: spec.max,
            steps: spec.steps,
            tag: spec.tag,
            value: 0.0,
        };
        param.value = param.quantize(initial);
        param
    }

    /// Current authoritative value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Clamp into bounds and snap onto the step grid when discrete.
    fn quantize(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        match self.steps {
            Some(steps) if steps > 1 => {
                let grid = (self.max - self.min) / (steps - 1) as f64;
                self.min + ((clamped - self.min) / grid).round() * grid
            }
            _ => clamped,
        }
    }
}

/// Notification that a parameter's authoritative value changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub index: usize,
    pub value: f64,
}

/// A decoded data buffer attached to the device.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub channels: usize,
    pub sample_rate: u32,
    pub data: Vec<f32>,
}

/// The opaque processing structure supplied by the runtime.
pub trait DeviceDsp: Send {
    /// Called whenever a parameter's authoritative value changes, including
    /// once per parameter at construction.
    fn param_changed(&mut self, index: usize, value: f64);

    /// A named data buffer became available.
    fn buffer_loaded(&mut self, _id: &str, _buffer: &SampleBuffer) {}

    fn render_block(&mut self, out: &mut [f32]);
}

pub struct Device {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
    dsp: Box<dyn DeviceDsp>,
    buffers: HashMap<String, SampleBuffer>,
    change_tx: Producer<ParamChange>,
    change_rx: Option<Consumer<ParamChange>>,
    sample_rate: f32,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("params", &self.params)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Build a device from parameter definitions and a processing structure.
    ///
    /// Initial values come from the descriptor (falling back to each
    /// parameter's minimum) and are pushed into the dsp, but not onto the
    /// change channel: nothing is subscribed yet.
    pub fn new(
        config: &AudioConfig,
        specs: &[ParameterSpec],
        dsp: Box<dyn DeviceDsp>,
    ) -> Result<Self, DeviceError> {
        let mut index = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if spec.min > spec.max {
                return Err(DeviceError::InvalidBounds {
                    id: spec.id.clone(),
                    min: spec.min,
                    max: spec.max,
                });
            }
            if index.insert(spec.id.clone(), i).is_some() {
                return Err(DeviceError::DuplicateParam(spec.id.clone()));
            }
        }

        let params: Vec<Parameter> = specs.iter().map(Parameter::from_spec).collect();
        let (change_tx, change_rx) = RingBuffer::new(CHANGE_QUEUE_CAP);

        let mut device = Self {
            params,
            index,
            dsp,
            buffers: HashMap::new(),
            change_tx,
            change_rx: Some(change_rx),
            sample_rate: config.sample_rate,
        };
        for i in 0..device.params.len() {
            let value = device.params[i].value;
            device.dsp.param_changed(i, value);
        }
        Ok(device)
    }

    pub fn num_parameters(&self) -> usize {
        self.params.len()
    }

    /// Parameters in their stable, descriptor-reported order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    pub fn param_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Write a parameter value. The device clamps and quantizes; the value
    /// actually adopted is returned and echoed on the change channel.
    pub fn set_param(&mut self, index: usize, value: f64) -> f64 {
        let accepted = self.params[index].quantize(value);
        self.params[index].value = accepted;
        self.dsp.param_changed(index, accepted);
        let _ = self.change_tx.push(ParamChange { index, value: accepted });
        accepted
    }

    /// Apply a preset payload: an object mapping parameter ids to values.
    /// Unknown ids and non-numeric values are ignored.
    pub fn apply_preset(&mut self, payload: &serde_json::Value) {
        let Some(map) = payload.as_object() else {
            warn!("preset payload is not an object, ignoring");
            return;
        };
        for (id, value) in map {
            if let (Some(index), Some(v)) = (self.param_index(id), value.as_f64()) {
                self.set_param(index, v);
            }
        }
    }

    /// Attach resolved data-buffer dependencies. Per-entry failures are
    /// skipped with a warning; the dependency set is optional end to end.
    pub fn load_data_buffers(&mut self, deps: &[DependencyEntry]) {
        for dep in deps {
            let Some(path) = dep.file.as_deref() else {
                continue;
            };
            match load_wav(path) {
                Ok(buffer) => {
                    info!(
                        "attached buffer `{}` ({} frames)",
                        dep.id,
                        buffer.data.len() / buffer.channels.max(1)
                    );
                    self.dsp.buffer_loaded(&dep.id, &buffer);
                    self.buffers.insert(dep.id.clone(), buffer);
                }
                Err(err) => warn!("skipping buffer `{}`: {err}", dep.id),
            }
        }
    }

    pub fn num_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Hand out the change-channel consumer. Yields `Some` exactly once.
    pub fn take_change_rx(&mut self) -> Option<Consumer<ParamChange>> {
        self.change_rx.take()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Render one block of mono samples. Called from the audio callback.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.dsp.render_block(out);
    }
}

fn load_wav(path: &Path) -> Result<SampleBuffer, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let data: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            reader.samples::<f32>().collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    Ok(SampleBuffer {
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
        data,
    })
}
