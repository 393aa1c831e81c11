//! Segring
//!
//! A circular progress indicator split into N arcs. One overall progress
//! value (0..max) is distributed across the arcs, which fill one after
//! another; an optional indicator glyph follows the tip of the filled arc.
//!
//! # Example
//!
//! ```rust
//! use segring::{ProgressState, SegmentedProgress};
//! use segring_animation::AnimationScheduler;
//! use segring_core::ProgressConfig;
//!
//! let scheduler = AnimationScheduler::new();
//! let mut progress = SegmentedProgress::new(ProgressConfig::new(100.0), scheduler.handle());
//!
//! progress.run(75.0);
//! assert_eq!(progress.state(), ProgressState::Running);
//!
//! while scheduler.advance(16.0) {}
//! assert_eq!(progress.state(), ProgressState::Idle);
//! assert_eq!(progress.render().arc_count(), 6);
//! ```

pub mod observer;
pub mod progress;
pub mod render;

pub use observer::{IndicatorUpdate, ProgressObserver};
pub use progress::{ProgressState, SegmentedProgress};
pub use render::{BaseTrack, IndicatorGlyph, Layout, LineCap, ProgressArc, RenderPass};
