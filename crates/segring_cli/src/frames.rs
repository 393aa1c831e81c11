//! Frame capture for `segring simulate`
//!
//! The indicator position only exists in observer callbacks, so a
//! [`FrameRecorder`] keeps the latest update and each frame snapshot reads it
//! alongside the segment values and resolved dash offsets.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use segring::{IndicatorUpdate, ProgressObserver, SegmentedProgress};
use segring_core::AnimationAccess;
use serde::Serialize;

/// Keeps the most recent indicator update
#[derive(Default)]
pub struct FrameRecorder {
    indicator: Mutex<Option<IndicatorUpdate>>,
}

impl FrameRecorder {
    pub fn latest(&self) -> Option<IndicatorUpdate> {
        self.indicator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressObserver for FrameRecorder {
    fn indicator_moved(&self, update: &IndicatorUpdate) {
        *self.indicator.lock().unwrap_or_else(PoisonError::into_inner) = Some(update.clone());
    }
}

/// Indicator glyph as printed
#[derive(Debug, Serialize)]
pub struct IndicatorFrame {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl From<IndicatorUpdate> for IndicatorFrame {
    fn from(update: IndicatorUpdate) -> Self {
        Self {
            x: update.position.x,
            y: update.position.y,
            label: update.label,
        }
    }
}

/// State of one indicator after a frame
#[derive(Debug, Serialize)]
pub struct Frame {
    pub time_ms: f64,
    pub segments: Vec<f64>,
    pub dash_offsets: Vec<f64>,
    pub indicator: Option<IndicatorFrame>,
}

impl Frame {
    pub fn capture<C>(
        time_ms: f64,
        progress: &SegmentedProgress<C>,
        animations: &dyn AnimationAccess,
        recorder: &FrameRecorder,
    ) -> Self {
        let pass = progress.render();
        Self {
            time_ms,
            segments: (0..pass.overlays.len())
                .map(|i| progress.segment_value(i))
                .collect(),
            dash_offsets: pass
                .overlays
                .iter()
                .map(|arc| arc.resolve(animations))
                .collect(),
            indicator: recorder.latest().map(IndicatorFrame::from),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8.1}ms  values [", self.time_ms)?;
        for (i, value) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value:.4}")?;
        }
        write!(f, "]  offsets [")?;
        for (i, offset) in self.dash_offsets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{offset:.2}")?;
        }
        write!(f, "]")?;
        if let Some(indicator) = &self.indicator {
            write!(
                f,
                "  indicator ({:.2}, {:.2}) {}",
                indicator.x, indicator.y, indicator.label
            )?;
        }
        Ok(())
    }
}
