//! Planar geometry used by the weather classifier.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ORIGIN: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_polar(radius: f64, angle_rad: f64) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self {
            x: radius * cos,
            y: radius * sin,
        }
    }

    /// Same as [`Vector2::from_polar`] but places quarter turns exactly on the
    /// axes, where `cos(π/2)` would otherwise leave a residue of ~1e-17.
    pub fn from_polar_degrees(radius: f64, angle_deg: f64) -> Self {
        let quarter_turns = angle_deg / 90.0;
        if quarter_turns.fract() == 0.0 {
            let (x, y) = match (quarter_turns as i64).rem_euclid(4) {
                0 => (radius, 0.0),
                1 => (0.0, radius),
                2 => (-radius, 0.0),
                _ => (0.0, -radius),
            };
            return Self { x, y };
        }
        Self::from_polar(radius, angle_deg.to_radians())
    }

    /// `"<x>,<y>"` with six decimals.
    pub fn to_location_string(&self) -> String {
        format!("{:.6},{:.6}", self.x, self.y)
    }
}

/// Signed area of the triangle `abc`.
pub fn signed_area(a: Vector2, b: Vector2, c: Vector2) -> f64 {
    ((a.x - b.x) * (b.y - c.y) - (b.x - c.x) * (a.y - b.y)) / 2.0
}

/// Exact collinearity: the signed area must be zero, not merely small.
pub fn are_aligned(a: Vector2, b: Vector2, c: Vector2) -> bool {
    signed_area(a, b, c) == 0.0
}

pub fn are_aligned_within(a: Vector2, b: Vector2, c: Vector2, tolerance: f64) -> bool {
    signed_area(a, b, c).abs() <= tolerance
}

fn edge_sign(p: Vector2, q: Vector2, r: Vector2) -> f64 {
    (p.x - r.x) * (q.y - r.y) - (q.x - r.x) * (p.y - r.y)
}

/// Reports whether `point` lies inside the triangle or on one of its edges.
pub fn in_triangle(point: Vector2, v1: Vector2, v2: Vector2, v3: Vector2) -> bool {
    let d1 = edge_sign(point, v1, v2);
    let d2 = edge_sign(point, v2, v3);
    let d3 = edge_sign(point, v3, v1);

    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_negative && has_positive)
}
