//! Render descriptors
//!
//! What the vector renderer draws for one indicator: N base-track arcs,
//! N progress arcs on top, and optionally the indicator glyph. Every arc is a
//! full-circle stroke rotated to its segment's start, with the dash offset
//! hiding everything past the segment.

use std::f64::consts::PI;

use segring_core::{
    circumference, AnimationAccess, BoxedValue, Color, Point, ProgressConfig, StrokeOffset,
};

/// Geometry shared by every arc of one indicator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub radius: f64,
    pub stroke_width: f64,
    pub segments: usize,
    pub gap: f64,
    pub circumference: f64,
    /// Distance from the view box edge to the circle center
    pub half_circle: f64,
    /// Start angle of the first segment, in degrees
    pub rotation: f64,
}

impl Layout {
    pub fn new(config: &ProgressConfig) -> Self {
        let indicator_room = config.indicator.as_ref().map_or(0.0, |i| i.radius);
        let radius = config.radius;
        let rotation = if radius != 0.0 {
            -90.0 + (180.0 * (config.segments_gap / 2.0 / radius)) / PI
        } else {
            -90.0
        };

        Self {
            radius,
            stroke_width: config.stroke_width,
            segments: config.segments.max(1),
            gap: config.segments_gap,
            circumference: circumference(radius),
            half_circle: radius + config.stroke_width + indicator_room,
            rotation,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.half_circle, self.half_circle)
    }

    /// Side length of the square view box
    pub fn view_box(&self) -> f64 {
        self.half_circle * 2.0
    }

    /// Start angle of segment `index`, in degrees
    pub fn segment_rotation(&self, index: usize) -> f64 {
        self.rotation + (index as f64 * 360.0) / self.segments as f64
    }

    /// Dash offset of a base track: one segment's share, minus the gap
    pub fn base_dash_offset(&self) -> f64 {
        self.circumference - self.circumference / self.segments as f64 + self.gap
    }
}

/// Stroke cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
}

/// Static unfilled arc behind a segment
#[derive(Clone, Debug, PartialEq)]
pub struct BaseTrack {
    pub index: usize,
    pub center: Point,
    pub radius: f64,
    pub rotation: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub dash_array: f64,
    pub dash_offset: f64,
    pub line_cap: LineCap,
}

/// Filled arc of a segment, driven by the segment's animated value
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressArc {
    pub index: usize,
    pub center: Point,
    pub radius: f64,
    pub rotation: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub dash_array: f64,
    /// Dash offset as a function of the animated value
    pub offset: StrokeOffset,
    /// Raw id of the segment's animated value
    pub source: u64,
    pub line_cap: LineCap,
}

impl ProgressArc {
    /// Dash offset as a render-time value
    pub fn dash_offset(&self) -> BoxedValue<f64> {
        self.offset.clone().bind(self.source)
    }

    /// Dash offset for the current frame
    pub fn resolve(&self, animations: &dyn AnimationAccess) -> f64 {
        match &self.offset {
            StrokeOffset::Static(offset) => *offset,
            offset => offset.resolve(animations.animated_value(self.source).unwrap_or(0.0)),
        }
    }
}

/// Indicator circle and label styling; the position arrives per frame
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorGlyph {
    pub radius: f64,
    pub stroke_width: f64,
    pub stroke: Color,
    pub fill: Color,
    pub label_color: Color,
    pub font_size: f64,
}

/// Everything the renderer needs for one pass
#[derive(Debug)]
pub struct RenderPass<'a, C> {
    pub view_box: f64,
    pub height: f64,
    pub base_tracks: Vec<BaseTrack>,
    pub overlays: Vec<ProgressArc>,
    pub indicator: Option<IndicatorGlyph>,
    /// Opaque content drawn at the center, passed through untouched
    pub center: Option<&'a C>,
}

impl<C> RenderPass<'_, C> {
    /// Number of arc elements (base tracks plus progress arcs)
    pub fn arc_count(&self) -> usize {
        self.base_tracks.len() + self.overlays.len()
    }
}
