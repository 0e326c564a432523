//! Day and night colour schemes and the cross-fade between them.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    /// Darkens towards black; `brightness` in [0, 1].
    pub fn dim(self, brightness: f32) -> Rgb {
        let t = (brightness.clamp(0.0, 1.0) * 256.0) as u16;
        Rgb::lerp(Rgb(0, 0, 0), self, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub sky: Rgb,
    pub cloud: Rgb,
    pub ground: Rgb,
    pub ground_speck: Rgb,
    pub ink: Rgb,
    pub ink_light: Rgb,
    pub cactus: Rgb,
    pub text: Rgb,
}

pub const DAY: Palette = Palette {
    sky: Rgb(247, 247, 247),
    cloud: Rgb(218, 218, 218),
    ground: Rgb(83, 83, 83),
    ground_speck: Rgb(150, 150, 150),
    ink: Rgb(83, 83, 83),
    ink_light: Rgb(247, 247, 247),
    cactus: Rgb(83, 83, 83),
    text: Rgb(83, 83, 83),
};

pub const NIGHT: Palette = Palette {
    sky: Rgb(32, 33, 36),
    cloud: Rgb(72, 74, 80),
    ground: Rgb(172, 172, 172),
    ground_speck: Rgb(110, 110, 110),
    ink: Rgb(205, 205, 205),
    ink_light: Rgb(32, 33, 36),
    cactus: Rgb(172, 172, 172),
    text: Rgb(230, 230, 230),
};

/// Tint applied to the player after a collision.
pub const DEFEAT: Rgb = Rgb(255, 0, 0);
pub const PANEL: Rgb = Rgb(20, 20, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Out(Duration),
    In(Duration),
}

/// Fade-out, swap, fade-in.
///
/// The applied scheme only changes when the fade-out completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteFade {
    dark: bool,
    target: bool,
    stage: Stage,
    fade: Duration,
}

impl PaletteFade {
    pub fn new(fade: Duration) -> Self {
        Self {
            dark: false,
            target: false,
            stage: Stage::Idle,
            fade,
        }
    }

    pub fn start(&mut self, dark: bool) {
        self.target = dark;
        self.stage = match self.stage {
            Stage::Idle => Stage::Out(Duration::ZERO),
            // Resume fading out from the current brightness.
            Stage::In(elapsed) => Stage::Out(self.fade.saturating_sub(elapsed)),
            out @ Stage::Out(_) => out,
        };
    }

    /// Returns true on the call that applies the swap.
    pub fn advance(&mut self, dt: Duration) -> bool {
        match self.stage {
            Stage::Idle => false,
            Stage::Out(elapsed) => {
                let elapsed = elapsed + dt;
                if elapsed < self.fade {
                    self.stage = Stage::Out(elapsed);
                    return false;
                }
                self.dark = self.target;
                let left = elapsed - self.fade;
                self.stage = if left < self.fade {
                    Stage::In(left)
                } else {
                    Stage::Idle
                };
                true
            }
            Stage::In(elapsed) => {
                let elapsed = elapsed + dt;
                self.stage = if elapsed < self.fade {
                    Stage::In(elapsed)
                } else {
                    Stage::Idle
                };
                false
            }
        }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn is_fading(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn brightness(&self) -> f32 {
        let fade = self.fade.as_secs_f32();
        match self.stage {
            Stage::Idle => 1.0,
            Stage::Out(elapsed) => 1.0 - elapsed.as_secs_f32() / fade,
            Stage::In(elapsed) => elapsed.as_secs_f32() / fade,
        }
    }

    pub fn palette(&self) -> &'static Palette {
        if self.dark { &NIGHT } else { &DAY }
    }
}
