//! Synthesised sound effects.
//!
//! Each [`Sound`] is a small fundsp graph rendered sample by sample by a
//! [`Voice`]. Output goes through [`crate::audio`]; nothing here touches an
//! audio device.

use fundsp::prelude::*;

pub const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Jump,
    Point,
    Defeat,
}

impl Sound {
    /// Length in seconds.
    pub fn duration(self) -> f32 {
        match self {
            Sound::Jump => 0.15,
            Sound::Point => 0.2,
            Sound::Defeat => 0.5,
        }
    }

    fn graph(self) -> Box<dyn AudioUnit> {
        match self {
            // Short rising chirp.
            Sound::Jump => {
                let freq = lfo(|t: f32| lerp(300.0f32, 620.0, (t / 0.12).min(1.0)));
                let gain = lfo(|t: f32| lerp(0.12f32, 0.0, (t / 0.15).min(1.0)));
                Box::new((freq >> square()) * gain)
            }
            // Two-note blip, B5 then E6.
            Sound::Point => {
                let freq = lfo(|t: f32| if t < 0.07 { 987.8f32 } else { 1318.5 });
                let gain = lfo(|t: f32| lerp(0.1f32, 0.0, (t / 0.2).min(1.0)));
                Box::new((freq >> sine::<f32>()) * gain)
            }
            // 400Hz to 80Hz over 0.4s, fading out over 0.5s.
            Sound::Defeat => {
                let freq = lfo(|t: f32| lerp(400.0f32, 80.0, (t / 0.4).min(1.0)));
                let gain = lfo(|t: f32| lerp(0.15f32, 0.0, (t / 0.5).min(1.0)));
                Box::new((freq >> saw()) * gain)
            }
        }
    }
}

/// A finite mono sample stream for one sound.
pub struct Voice {
    unit: Box<dyn AudioUnit>,
    remaining: usize,
}

impl Voice {
    pub fn new(sound: Sound) -> Self {
        let mut unit = sound.graph();
        unit.set_sample_rate(SAMPLE_RATE as f64);
        Self {
            unit,
            remaining: (SAMPLE_RATE as f32 * sound.duration()) as usize,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for Voice {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let mut out = [0.0f32; 1];
        self.unit.tick(&[], &mut out);
        Some(out[0])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
