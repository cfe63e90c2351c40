//! The parameter binding layer.
//!
//! One [`ControlPair`] (slider + text mirror) per device parameter, in the
//! device's stable order, with two synchronization directions:
//!
//! * UI → device: continuous slider input during a drag, and explicit text
//!   commits. The device stays the sole writer of authoritative values;
//!   every write comes back on the change channel after clamping and
//!   quantization.
//! * device → UI: [`BindingLayer::poll_changes`] drains the change channel.
//!   Text mirrors update unconditionally; slider positions only update
//!   while no drag is in progress, so a device echo never fights the
//!   user's active gesture.
//!
//! The drag gate lives in an explicit [`SyncState`] owned by the layer.

mod effects;

pub use effects::{EffectBinding, GestureEdge, ThemeFlag, ThemeState};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::warn;
use rtrb::Consumer;

use crate::device::{Device, ParamChange};

/// Granularity divisor for continuous parameters: dense but finite.
const CONTINUOUS_STEPS: f64 = 1000.0;

/// Format a value the way every text mirror displays it.
pub fn format_value(value: f64) -> String {
    format!("{value:.3}")
}

/// Slider mirror of one parameter.
#[derive(Debug, Clone)]
pub struct SliderControl {
    pub min: f64,
    pub max: f64,
    /// Step granularity: `(max-min)/(steps-1)` for discrete parameters,
    /// `(max-min)/1000` for continuous ones.
    pub granularity: f64,
    pub position: f64,
}

/// Text mirror of one parameter. Always rendered with three decimals.
#[derive(Debug, Clone)]
pub struct TextControl {
    pub content: String,
}

/// The UI binding record for one parameter.
pub struct ControlPair {
    pub param_id: String,
    pub label: String,
    pub slider: SliderControl,
    pub text: TextControl,
    effect: Option<EffectBinding>,
}

/// Synchronization state shared by all control pairs.
///
/// A single drag gate: simultaneous drags on two sliders would need two
/// pointers, which single-pointer input cannot produce, so per-control
/// isolation is deliberately not implemented.
#[derive(Debug, Default)]
pub struct SyncState {
    dragging: bool,
}

impl SyncState {
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

pub struct BindingLayer {
    device: Arc<Mutex<Device>>,
    changes: Consumer<ParamChange>,
    pairs: Vec<ControlPair>,
    index: HashMap<String, usize>,
    sync: SyncState,
    theme: ThemeState,
}

impl BindingLayer {
    /// Build one control pair per device parameter and resolve effect
    /// bindings from the declared tags.
    pub fn build(device: Arc<Mutex<Device>>, changes: Consumer<ParamChange>) -> Self {
        let mut pairs = Vec::new();
        let mut index = HashMap::new();
        {
            let locked = device.lock().unwrap();
            for (i, param) in locked.parameters().iter().enumerate() {
                let span = param.max - param.min;
                let granularity = match param.steps {
                    Some(steps) if steps > 1 => span / (steps - 1) as f64,
                    _ => span / CONTINUOUS_STEPS,
                };
                let value = param.value();
                pairs.push(ControlPair {
                    param_id: param.id.clone(),
                    label: param.name.clone(),
                    slider: SliderControl {
                        min: param.min,
                        max: param.max,
                        granularity,
                        position: value,
                    },
                    text: TextControl { content: format_value(value) },
                    effect: param.tag.map(effects::resolve),
                });
                index.insert(param.id.clone(), i);
            }
        }
        Self {
            device,
            changes,
            pairs,
            index,
            sync: SyncState::default(),
            theme: ThemeState::default(),
        }
    }

    /// Control pairs in device parameter order.
    pub fn pairs(&self) -> &[ControlPair] {
        &self.pairs
    }

    pub fn pair(&self, id: &str) -> Option<&ControlPair> {
        self.index.get(id).map(|&i| &self.pairs[i])
    }

    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    /// Continuous slider input. The only UI path that writes the parameter
    /// mid-drag. The slider mirror follows the gesture directly; the text
    /// mirror catches up from the device echo.
    pub fn slider_input(&mut self, id: &str, value: f64) {
        let Some(&i) = self.index.get(id) else {
            warn!("slider input for unknown parameter `{id}`");
            return;
        };
        let slider = &mut self.pairs[i].slider;
        let value = value.clamp(slider.min, slider.max);
        slider.position = value;
        self.device.lock().unwrap().set_param(i, value);
    }

    /// Explicit text commit. Unparseable input reverts the text mirror to
    /// the authoritative value without touching the parameter; valid input
    /// is clamped into bounds, written, and echoed back to the display.
    pub fn text_commit(&mut self, id: &str, input: &str) {
        let Some(&i) = self.index.get(id) else {
            warn!("text commit for unknown parameter `{id}`");
            return;
        };
        match input.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                let pair = &mut self.pairs[i];
                let clamped = value.clamp(pair.slider.min, pair.slider.max);
                self.device.lock().unwrap().set_param(i, clamped);
                pair.text.content = format_value(clamped);
            }
            _ => {
                let current = self.param_value(i);
                self.pairs[i].text.content = format_value(current);
            }
        }
    }

    /// Drag gesture began on a slider.
    pub fn gesture_start(&mut self, id: &str) {
        let Some(&i) = self.index.get(id) else { return };
        self.sync.dragging = true;
        self.run_effect(i, GestureEdge::Start);
    }

    /// Drag gesture ended. Both mirrors reconcile to the authoritative
    /// value, picking up any quantization or external change that happened
    /// mid-drag.
    pub fn gesture_end(&mut self, id: &str) {
        let Some(&i) = self.index.get(id) else { return };
        self.sync.dragging = false;
        let value = self.param_value(i);
        let pair = &mut self.pairs[i];
        pair.slider.position = value;
        pair.text.content = format_value(value);
        self.run_effect(i, GestureEdge::End);
    }

    /// Drain device-originated change notifications into the mirrors.
    pub fn poll_changes(&mut self) {
        while let Ok(change) = self.changes.pop() {
            let Some(pair) = self.pairs.get_mut(change.index) else {
                continue;
            };
            pair.text.content = format_value(change.value);
            if !self.sync.dragging {
                pair.slider.position = change.value;
            }
        }
    }

    fn run_effect(&mut self, i: usize, edge: GestureEdge) {
        let Some(effect) = self.pairs[i].effect else { return };
        if effect.edge != edge {
            return;
        }
        let value = self.param_value(i);
        self.theme.set(effect.flag, value > effect.threshold);
    }

    fn param_value(&self, i: usize) -> f64 {
        self.device.lock().unwrap().parameters()[i].value()
    }
}
