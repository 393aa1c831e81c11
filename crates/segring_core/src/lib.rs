//! Segring Core
//!
//! Pure numeric building blocks for a segmented circular progress indicator:
//!
//! - **Segment Allocation**: Distribute an overall progress value across N arcs
//! - **Arc Geometry**: Locate the tip of a painted arc on its circle
//! - **Stroke Offsets**: Map a live animated value to a dash offset, gaps included
//! - **Render Values**: Static or interpolated values resolved at render time
//! - **Configuration**: Serde-backed settings with documented defaults
//!
//! # Example
//!
//! ```rust
//! use segring_core::allocate;
//!
//! let targets = allocate(Some(90.0), 100.0, 3);
//! assert_eq!(targets.as_slice(), &[33.3333, 33.3333, 23.3333]);
//! ```

pub mod allocate;
pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod offset;
pub mod value;

pub use allocate::{allocate, round4, SegmentTargets};
pub use color::Color;
pub use config::{IndicatorConfig, ProgressConfig, TimingConfig};
pub use easing::Easing;
pub use error::{ConfigError, Result};
pub use geometry::{arc_endpoint, circumference, Point};
pub use offset::{stroke_offset, GapGeometry, Interpolation, StrokeOffset};
pub use value::{AnimationAccess, BoxedValue, Interpolated, Static, Value, ValueContext};
