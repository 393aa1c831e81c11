//! Circle geometry helpers
//!
//! For an arc of length `s` on a circle of radius `r`, the swept angle is
//! `θ = s / r`. The tip of the arc sits at `(r·cos θ + cx, r·sin θ + cy)`.

use std::f64::consts::PI;

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Full drawable arc length of a circle
pub fn circumference(radius: f64) -> f64 {
    2.0 * PI * radius
}

fn is_missing(value: f64) -> bool {
    value == 0.0 || !value.is_finite()
}

/// Cartesian position of the end of an arc of `arc_length`
///
/// `rotation_degrees` offsets the start of the arc. A zero or non-finite
/// radius, arc length or center coordinate yields [`Point::ZERO`].
pub fn arc_endpoint(radius: f64, arc_length: f64, cx: f64, cy: f64, rotation_degrees: f64) -> Point {
    if [radius, arc_length, cx, cy].into_iter().any(is_missing) {
        return Point::ZERO;
    }

    let theta = arc_length / radius + rotation_degrees * PI / 180.0;
    Point {
        x: theta.cos() * radius + cx,
        y: theta.sin() * radius + cy,
    }
}
