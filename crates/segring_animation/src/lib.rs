//! Segring Animation System
//!
//! Timed transitions of scalar values, driven by an external frame clock.
//!
//! # Features
//!
//! - **Animated Values**: Scalars owned by a scheduler, readable at render time
//! - **Frame Listeners**: Per-value callbacks invoked once per frame on change
//! - **Timelines**: Timing transitions composed in sequence or in parallel
//! - **Clean Cancellation**: Stopping a value halts every timeline driving it
//! - **Explicit Clock**: `advance(dt_ms)` for deterministic frame stepping
//!
//! # Example
//!
//! ```rust
//! use segring_animation::{Animation, AnimatedValue, AnimationScheduler};
//!
//! let scheduler = AnimationScheduler::new();
//! let value = AnimatedValue::new(scheduler.handle(), 0.0);
//!
//! scheduler.start_timeline(value.timing(100.0, 1000.0).delay(10.0).into(), None);
//! scheduler.advance(510.0);
//! assert!((value.get() - 50.0).abs() < 1e-9);
//! ```

pub mod scheduler;
pub mod timeline;

pub use scheduler::{
    AnimatedValue, AnimationScheduler, CompletionCallback, ListenerId, SchedulerHandle,
    TickCallback, TimelineId, ValueId,
};
pub use segring_core::Easing;
pub use timeline::{Animation, Timing};
