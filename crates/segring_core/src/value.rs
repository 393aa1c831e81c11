//! Values resolved at render time
//!
//! The renderer stores values rather than numbers so that animated
//! properties update without rebuilding the draw list:
//! - Static values (constants)
//! - Interpolated values (a live animated value mapped through breakpoints)

use std::sync::Arc;

use crate::offset::Interpolation;

/// Context provided to value resolution at render time
pub struct ValueContext<'a> {
    /// Access to live animated values
    pub animations: &'a dyn AnimationAccess,
}

impl<'a> ValueContext<'a> {
    pub fn new(animations: &'a dyn AnimationAccess) -> Self {
        Self { animations }
    }
}

/// Trait for reading live animated values by raw id
pub trait AnimationAccess {
    /// Current value of an animated value, `None` if it no longer exists
    fn animated_value(&self, id: u64) -> Option<f64>;
}

/// A value that can be resolved at render time
pub trait Value<T>: Send + Sync {
    /// Resolve the current value
    fn get(&self, ctx: &ValueContext) -> T;

    /// Check if this is a static value (never changes)
    fn is_static(&self) -> bool {
        false
    }
}

/// A static value that never changes
#[derive(Clone, Debug)]
pub struct Static<T>(pub T);

impl<T: Clone + Send + Sync> Value<T> for Static<T> {
    fn get(&self, _ctx: &ValueContext) -> T {
        self.0.clone()
    }

    fn is_static(&self) -> bool {
        true
    }
}

/// A live animated value mapped through an [`Interpolation`]
///
/// A missing source resolves as if the animated value were zero.
#[derive(Clone, Debug)]
pub struct Interpolated {
    source: u64,
    map: Interpolation,
}

impl Interpolated {
    pub fn new(source: u64, map: Interpolation) -> Self {
        Self { source, map }
    }

    pub fn source(&self) -> u64 {
        self.source
    }
}

impl Value<f64> for Interpolated {
    fn get(&self, ctx: &ValueContext) -> f64 {
        let live = ctx.animations.animated_value(self.source).unwrap_or(0.0);
        self.map.evaluate(live)
    }
}

/// Type-erased value for storage in render descriptors
pub type BoxedValue<T> = Arc<dyn Value<T>>;
