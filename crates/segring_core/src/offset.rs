//! Stroke dash offsets for progress segments
//!
//! A segment is drawn as a full-circle stroke whose dash offset hides all but
//! the filled portion. The offset starts at the circumference (nothing
//! painted) and shrinks toward the filled amount as the segment's animated
//! value moves from 0 to its target. The gap between segments is carved out
//! of the painted length, so a segment stays hidden until its animated value
//! has covered the gap.

use smallvec::SmallVec;

use crate::value::{BoxedValue, Interpolated, Static};

/// Per-segment gap scalars, derived from the target each frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapGeometry {
    /// Arc length this segment loses to the surrounding gaps
    pub gap_adjust: f64,
    /// Animated value below which the segment stays hidden
    pub threshold: f64,
    /// Dash offset once the animated value reaches the target
    pub target_offset: f64,
}

impl GapGeometry {
    pub fn new(target: f64, circumference: f64, segment_count: usize, gap: f64) -> Self {
        let gap_adjust = segment_count as f64 * target * gap / 100.0;
        let target_offset = circumference * (1.0 - target / 100.0) + gap_adjust;
        let threshold = if gap_adjust > 0.0 {
            gap_adjust * 100.0 / circumference
        } else {
            0.0
        };

        Self {
            gap_adjust,
            threshold,
            target_offset,
        }
    }
}

/// Clamped piecewise-linear mapping
///
/// Inputs must be non-decreasing. Inputs outside the first/last breakpoint
/// map to the first/last output.
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolation {
    input: SmallVec<[f64; 3]>,
    output: SmallVec<[f64; 3]>,
}

impl Interpolation {
    /// Build from `(input, output)` breakpoints
    ///
    /// Returns `None` for an empty list or decreasing inputs.
    pub fn new(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() || points.windows(2).any(|w| w[1].0 < w[0].0) {
            return None;
        }
        Some(Self {
            input: points.iter().map(|p| p.0).collect(),
            output: points.iter().map(|p| p.1).collect(),
        })
    }

    pub fn input_range(&self) -> &[f64] {
        &self.input
    }

    pub fn output_range(&self) -> &[f64] {
        &self.output
    }

    /// Map a live input through the breakpoints
    pub fn evaluate(&self, value: f64) -> f64 {
        let last = self.input.len() - 1;
        if value.is_nan() || value <= self.input[0] {
            return self.output[0];
        }
        if value >= self.input[last] {
            return self.output[last];
        }

        let i = self
            .input
            .windows(2)
            .position(|w| value < w[1])
            .unwrap_or(last - 1);
        let (x0, x1) = (self.input[i], self.input[i + 1]);
        let (y0, y1) = (self.output[i], self.output[i + 1]);
        if x1 == x0 {
            return y1;
        }
        y0 + (y1 - y0) * (value - x0) / (x1 - x0)
    }
}

/// Dash offset for one segment: fixed, or driven by its animated value
#[derive(Clone, Debug, PartialEq)]
pub enum StrokeOffset {
    Static(f64),
    Interpolated(Interpolation),
}

impl StrokeOffset {
    /// Offset for the given live animated value
    pub fn resolve(&self, animated: f64) -> f64 {
        match self {
            StrokeOffset::Static(offset) => *offset,
            StrokeOffset::Interpolated(map) => map.evaluate(animated),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, StrokeOffset::Static(_))
    }

    /// Bind to an animated value so the renderer can resolve it each frame
    ///
    /// `source` is the raw id understood by the renderer's
    /// [`AnimationAccess`](crate::value::AnimationAccess).
    pub fn bind(self, source: u64) -> BoxedValue<f64> {
        match self {
            StrokeOffset::Static(offset) => std::sync::Arc::new(Static(offset)),
            StrokeOffset::Interpolated(map) => std::sync::Arc::new(Interpolated::new(source, map)),
        }
    }
}

/// Dash offset mapping for a segment with the given target
///
/// See the module docs. Zero targets and targets fully consumed by the gap
/// stay at the circumference regardless of the animated value.
pub fn stroke_offset(
    target: f64,
    circumference: f64,
    segment_count: usize,
    gap: f64,
) -> StrokeOffset {
    if !(target > 0.0) {
        return StrokeOffset::Static(circumference);
    }

    let geometry = GapGeometry::new(target, circumference, segment_count, gap);

    if geometry.threshold >= target {
        return StrokeOffset::Static(circumference);
    }

    let points: SmallVec<[(f64, f64); 3]> = if geometry.threshold > 0.0 {
        smallvec::smallvec![
            (0.0, circumference),
            (geometry.threshold, circumference),
            (target, geometry.target_offset),
        ]
    } else {
        smallvec::smallvec![(0.0, circumference), (target, geometry.target_offset)]
    };

    match Interpolation::new(&points) {
        Some(map) => StrokeOffset::Interpolated(map),
        None => StrokeOffset::Static(circumference),
    }
}
