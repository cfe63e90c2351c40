//! Presentation side effects driven by parameter gestures.
//!
//! Parameters opt in through a declared tag in the descriptor; tags are
//! resolved into concrete bindings once, when the control surface is built.
//! Untagged parameters have no effect binding and gestures on them touch
//! nothing here.

use crate::patch::EffectTag;

/// Which edge of a drag gesture an effect evaluates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEdge {
    Start,
    End,
}

/// Theme flags the renderer reads. Purely presentational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeState {
    pub glow: bool,
    pub pulse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeFlag {
    Glow,
    Pulse,
}

impl ThemeState {
    pub fn set(&mut self, flag: ThemeFlag, on: bool) {
        match flag {
            ThemeFlag::Glow => self.glow = on,
            ThemeFlag::Pulse => self.pulse = on,
        }
    }

    pub fn get(&self, flag: ThemeFlag) -> bool {
        match flag {
            ThemeFlag::Glow => self.glow,
            ThemeFlag::Pulse => self.pulse,
        }
    }
}

/// A resolved effect: on `edge`, set `flag` to `value > threshold`.
#[derive(Debug, Clone, Copy)]
pub struct EffectBinding {
    pub edge: GestureEdge,
    pub flag: ThemeFlag,
    pub threshold: f64,
}

pub fn resolve(tag: EffectTag) -> EffectBinding {
    match tag {
        EffectTag::Glow => EffectBinding {
            edge: GestureEdge::End,
            flag: ThemeFlag::Glow,
            threshold: 0.01,
        },
        EffectTag::Pulse => EffectBinding {
            edge: GestureEdge::Start,
            flag: ThemeFlag::Pulse,
            threshold: 0.5,
        },
    }
}
