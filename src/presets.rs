//! The preset selector.
//!
//! Built only when the patch carries presets; a patch without any gets no
//! selector at all rather than a disabled one. Options are positional and
//! share a fixed placeholder label (preset slots are name-free by design).
//! Applying a preset delegates entirely to the device; the selector holds
//! no state beyond the option list and the current selection.

use std::sync::{Arc, Mutex};

use crate::device::Device;
use crate::patch::PresetEntry;

/// Placeholder label shared by every option.
pub const PRESET_LABEL: &str = "preset";

pub struct PresetSelector {
    device: Arc<Mutex<Device>>,
    options: Vec<PresetEntry>,
    selected: Option<usize>,
}

impl PresetSelector {
    /// `None` when there are no presets: the control is omitted entirely.
    pub fn build(device: Arc<Mutex<Device>>, presets: Vec<PresetEntry>) -> Option<Self> {
        if presets.is_empty() {
            return None;
        }
        Some(Self { device, options: presets, selected: None })
    }

    /// Number of selectable options (always at least 1).
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The fixed option label; indices distinguish options, labels do not.
    pub fn label(&self, _index: usize) -> &'static str {
        PRESET_LABEL
    }

    /// Apply the preset at `index`. Out-of-bounds indices are rejected;
    /// everything else is the device's business.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(entry) = self.options.get(index) else {
            return false;
        };
        self.device.lock().unwrap().apply_preset(&entry.payload);
        self.selected = Some(index);
        true
    }
}
