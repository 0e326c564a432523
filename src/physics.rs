//! Minimal arcade physics: a point body with gravity and axis-aligned boxes.
//!
//! World coordinates grow right and down. Bodies are anchored at the
//! bottom-centre of their sprite.

/// Axis-aligned rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Rectangle of a sprite of size `w`x`h` whose bottom-centre sits at
    /// (`x`, `y`).
    pub fn from_bottom_center(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect {
            x: x - w / 2.0,
            y: y - h,
            w,
            h,
        }
    }

    /// Sub-rectangle given as fractions of this one.
    pub fn inset(&self, offset: (f32, f32), size: (f32, f32)) -> Self {
        Rect {
            x: self.x + self.w * offset.0,
            y: self.y + self.h * offset.1,
            w: self.w * size.0,
            h: self.h * size.1,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Extra downward acceleration, units/s². Zero for bodies that ignore
    /// gravity.
    pub gravity: f32,
}

impl Body {
    /// Semi-implicit Euler step.
    pub fn integrate(&mut self, dt: f32) {
        self.vy += self.gravity * dt;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }
}

/// Snaps a body that has sunk below the ground while falling.
///
/// A body still moving up is left alone, even if its position reads below
/// the ground line for a frame.
pub fn ground_correction(y: f32, vy: f32, ground_y: f32) -> (f32, f32) {
    if y > ground_y && vy >= 0.0 {
        (ground_y, 0.0)
    } else {
        (y, vy)
    }
}
