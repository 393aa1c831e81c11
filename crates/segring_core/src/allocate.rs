//! Segment allocation
//!
//! Splits an overall progress value into per-segment fill targets. Segments
//! are filled greedily from the first one, each holding at most `100 / N` of
//! the normalized 0..100 scale.

use smallvec::SmallVec;

/// Per-segment fill targets on the normalized 0..100 scale
///
/// Element `i` is how much of the scale segment `i` must visually fill.
/// Every element lies in `[0, 100 / N]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentTargets(SmallVec<[f64; 4]>);

impl SegmentTargets {
    /// All-zero targets for `segments` segments
    pub fn zeros(segments: usize) -> Self {
        Self(SmallVec::from_elem(0.0, segments))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Target for a segment, zero when out of range
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Number of segments with a non-zero target
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|v| **v > 0.0).count()
    }
}

impl From<Vec<f64>> for SegmentTargets {
    fn from(values: Vec<f64>) -> Self {
        Self(SmallVec::from_vec(values))
    }
}

/// Round half away from zero at 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Distribute `progress` (on a `0..max` scale) across `segments` segments
///
/// Missing, zero, negative or NaN progress yields all zeros. Progress above
/// `max` is treated as `max`. The result always has exactly `segments`
/// elements and sums to `100 * min(progress, max) / max` up to rounding.
pub fn allocate(progress: Option<f64>, max: f64, segments: usize) -> SegmentTargets {
    let progress = match progress {
        Some(p) if p > 0.0 => p,
        _ => return SegmentTargets::zeros(segments),
    };
    if segments == 0 || !(max > 0.0) || !max.is_finite() {
        return SegmentTargets::zeros(segments);
    }

    let capacity = 100.0 / segments as f64;
    let mut remaining = 100.0 * progress.min(max) / max;
    let mut targets = SmallVec::with_capacity(segments);

    for _ in 0..segments {
        let taken = remaining.min(capacity).max(0.0);
        targets.push(round4(taken));
        remaining -= taken;
    }

    SegmentTargets(targets)
}
