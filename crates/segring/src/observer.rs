//! Per-frame side channel to the renderer
//!
//! The progress arcs are resolved declaratively from their animated values.
//! The indicator glyph is not: its position needs trigonometry the renderer
//! cannot express, so it is pushed through a [`ProgressObserver`].

use segring_core::Point;

/// New position and label of the indicator glyph
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorUpdate {
    /// Center of the indicator circle
    pub position: Point,
    /// Label anchor, horizontally centered below `position`
    pub label_position: Point,
    /// Rounded percentage, e.g. `"75%"`
    pub label: String,
    pub radius: f64,
    pub stroke_width: f64,
    pub font_size: f64,
}

/// Receives frame updates from a running indicator
pub trait ProgressObserver: Send + Sync {
    /// The indicator glyph moved along the filled arc
    fn indicator_moved(&self, update: &IndicatorUpdate);

    /// A segment's dash offset changed
    fn segment_offset(&self, _index: usize, _dash_offset: f64) {}
}
