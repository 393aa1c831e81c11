//! Segmented progress orchestration
//!
//! `SegmentedProgress` owns one animated value per segment plus one for the
//! indicator. Each `run()` call replaces the previous timeline:
//!
//! 1. Cancel: halt every value, detach every listener, reset to zero
//! 2. Allocate the new progress across the segments
//! 3. Attach the indicator listener (when shown) and segment listeners
//! 4. Start the segments in sequence, the indicator in parallel with them
//!
//! Cancellation finishes before anything new is attached, so a frame from a
//! superseded run can never reach the observer.

use std::sync::Arc;

use segring_animation::{Animation, AnimatedValue, SchedulerHandle, TimelineId};
use segring_core::{
    allocate, arc_endpoint, stroke_offset, Color, Point, ProgressConfig, SegmentTargets,
};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::observer::{IndicatorUpdate, ProgressObserver};
use crate::render::{BaseTrack, IndicatorGlyph, Layout, LineCap, ProgressArc, RenderPass};

/// Lifecycle of the current timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Running,
}

/// Animated segmented progress indicator
///
/// `C` is the opaque center content, handed back untouched in
/// [`RenderPass::center`].
pub struct SegmentedProgress<C = ()> {
    config: ProgressConfig,
    layout: Layout,
    handle: SchedulerHandle,
    overall: AnimatedValue,
    segments: SmallVec<[AnimatedValue; 4]>,
    targets: SegmentTargets,
    timeline: Option<TimelineId>,
    observer: Option<Arc<dyn ProgressObserver>>,
    center: Option<C>,
    runs: u64,
}

impl SegmentedProgress<()> {
    pub fn new(config: ProgressConfig, handle: SchedulerHandle) -> Self {
        Self::build(config, handle, None)
    }
}

impl<C> SegmentedProgress<C> {
    /// Create with content to draw at the center of the circle
    pub fn with_center(config: ProgressConfig, handle: SchedulerHandle, center: C) -> Self {
        Self::build(config, handle, Some(center))
    }

    fn build(mut config: ProgressConfig, handle: SchedulerHandle, center: Option<C>) -> Self {
        if config.segments == 0 {
            warn!("segmented progress configured with 0 segments, using 1");
            config.segments = 1;
        }
        if !(config.radius > 0.0) || !config.radius.is_finite() {
            warn!(radius = config.radius, "degenerate radius, indicator will stay unfilled");
        }
        if !(config.timing.max > 0.0) {
            warn!(max = config.timing.max, "non-positive progress max, every run is empty");
        }

        let layout = Layout::new(&config);
        let overall = AnimatedValue::new(handle.clone(), 0.0);
        let segments = (0..config.segments)
            .map(|_| AnimatedValue::new(handle.clone(), 0.0))
            .collect();
        let targets = SegmentTargets::zeros(config.segments);

        Self {
            config,
            layout,
            handle,
            overall,
            segments,
            targets,
            timeline: None,
            observer: None,
            center,
            runs: 0,
        }
    }

    /// Receive indicator and segment updates (builder pattern)
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the observer; takes effect on the next `run()`
    pub fn set_observer(&mut self, observer: Option<Arc<dyn ProgressObserver>>) {
        self.observer = observer;
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Targets computed by the latest `run()`
    pub fn targets(&self) -> &SegmentTargets {
        &self.targets
    }

    pub fn center(&self) -> Option<&C> {
        self.center.as_ref()
    }

    /// Current animated value of a segment
    pub fn segment_value(&self, index: usize) -> f64 {
        self.segments.get(index).map_or(0.0, AnimatedValue::get)
    }

    /// Current animated value of the indicator
    pub fn indicator_value(&self) -> f64 {
        self.overall.get()
    }

    pub fn state(&self) -> ProgressState {
        match self.timeline {
            Some(id) if self.handle.is_timeline_playing(id) => ProgressState::Running,
            _ => ProgressState::Idle,
        }
    }

    /// Animate from zero to `progress`, superseding any running animation
    ///
    /// Missing progress animates nothing but still restarts the lifecycle;
    /// progress above `max` is treated as `max`.
    pub fn run(&mut self, progress: impl Into<Option<f64>>) {
        let progress = progress.into();
        self.cancel();

        let timing = self.config.timing.clone();
        let targets = allocate(progress, timing.max, self.config.segments);
        let percent = percent_of(progress, timing.max);
        self.runs += 1;
        debug!(
            run = self.runs,
            percent,
            targets = ?targets.as_slice(),
            "starting segmented progress"
        );

        let indicator_visible = self.config.visible_indicator().is_some();
        if indicator_visible {
            self.attach_indicator(percent, &targets);
        }
        self.attach_segments(&targets);

        let sequence = Animation::sequence(self.segments.iter().enumerate().map(|(i, value)| {
            let target = targets.get(i);
            let delay = if i == 0 { timing.initial_delay_ms } else { 0.0 };
            value
                .timing(target, timing.duration_for(target))
                .delay(delay)
                .easing(timing.easing)
                .into()
        }));

        let animation = if indicator_visible {
            let indicator = self
                .overall
                .timing(percent, timing.duration_for(percent))
                .delay(timing.initial_delay_ms)
                .easing(timing.easing);
            Animation::parallel([sequence, indicator.into()])
        } else {
            sequence
        };

        let run = self.runs;
        self.timeline = self.handle.start_timeline(
            animation,
            Some(Box::new(move |finished| {
                debug!(run, finished, "segmented progress timeline ended");
            })),
        );
        self.targets = targets;
    }

    /// Halt all values, detach all listeners and reset to zero
    fn cancel(&mut self) {
        if let Some(id) = self.timeline.take() {
            self.handle.stop_timeline(id);
        }
        for value in self.values() {
            value.stop_animation();
        }
        for value in self.values() {
            value.remove_all_listeners();
        }
        for value in self.values() {
            value.set_value(0.0);
        }
    }

    /// Stop animating and detach from the scheduler's listeners
    pub fn dispose(&mut self) {
        self.cancel();
        debug!(runs = self.runs, "segmented progress disposed");
    }

    fn values(&self) -> impl Iterator<Item = &AnimatedValue> {
        std::iter::once(&self.overall).chain(self.segments.iter())
    }

    fn attach_indicator(&self, percent: f64, targets: &SegmentTargets) {
        let Some(indicator) = self.config.visible_indicator() else {
            return;
        };

        let label = format!("{}%", percent.round() as i64);
        let active = targets.active_count().max(1) as f64;
        let mean_gap = (percent / active) * self.layout.segments as f64 * self.layout.gap / 100.0;

        let observer = self.observer.clone();
        let layout = self.layout;
        let center = layout.center();
        let radius = indicator.radius;
        let stroke_width = indicator.stroke_width;
        let font_size = indicator.font_size;
        let label_offset_y = indicator.label_offset_y;

        self.overall.add_listener(move |tick| {
            let painted = layout.circumference * tick.min(percent) / 100.0 - mean_gap;
            if !(painted > 0.0) {
                return;
            }
            let position = arc_endpoint(layout.radius, painted, center.x, center.y, layout.rotation);
            trace!(tick, painted, x = position.x, y = position.y, "indicator frame");

            if let Some(observer) = &observer {
                observer.indicator_moved(&IndicatorUpdate {
                    position,
                    label_position: Point::new(position.x, position.y + label_offset_y),
                    label: label.clone(),
                    radius,
                    stroke_width,
                    font_size,
                });
            }
        });
    }

    fn attach_segments(&self, targets: &SegmentTargets) {
        let Some(observer) = &self.observer else {
            return;
        };
        for (index, value) in self.segments.iter().enumerate() {
            let offset = stroke_offset(
                targets.get(index),
                self.layout.circumference,
                self.layout.segments,
                self.layout.gap,
            );
            let observer = Arc::clone(observer);
            value.add_listener(move |tick| observer.segment_offset(index, offset.resolve(tick)));
        }
    }

    /// Describe everything to draw for the current targets
    pub fn render(&self) -> RenderPass<'_, C> {
        let layout = &self.layout;
        let center = layout.center();

        let base_tracks = (0..layout.segments)
            .map(|index| BaseTrack {
                index,
                center,
                radius: layout.radius,
                rotation: layout.segment_rotation(index),
                stroke: self.config.base_color,
                stroke_width: layout.stroke_width,
                dash_array: layout.circumference,
                dash_offset: layout.base_dash_offset(),
                line_cap: LineCap::Round,
            })
            .collect();

        let overlays = self
            .segments
            .iter()
            .enumerate()
            .map(|(index, value)| ProgressArc {
                index,
                center,
                radius: layout.radius,
                rotation: layout.segment_rotation(index),
                stroke: self.config.progress_color,
                stroke_width: layout.stroke_width,
                dash_array: layout.circumference,
                offset: stroke_offset(
                    self.targets.get(index),
                    layout.circumference,
                    layout.segments,
                    layout.gap,
                ),
                source: value.raw_id(),
                line_cap: LineCap::Round,
            })
            .collect();

        let indicator = self.config.visible_indicator().map(|indicator| IndicatorGlyph {
            radius: indicator.radius,
            stroke_width: indicator.stroke_width,
            stroke: indicator.color.unwrap_or(self.config.progress_color),
            fill: Color::WHITE,
            label_color: self.config.progress_color,
            font_size: indicator.font_size,
        });

        RenderPass {
            view_box: layout.view_box(),
            height: layout.radius * 2.0,
            base_tracks,
            overlays,
            indicator,
            center: self.center.as_ref(),
        }
    }
}

impl<C> Drop for SegmentedProgress<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Progress clamped to `[0, max]` and rescaled to 0..100
fn percent_of(progress: Option<f64>, max: f64) -> f64 {
    match progress {
        Some(p) if p > 0.0 && max > 0.0 && max.is_finite() => 100.0 * p.min(max) / max,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segring_animation::AnimationScheduler;
    use segring_core::IndicatorConfig;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        indicator: Mutex<Vec<IndicatorUpdate>>,
        segments: Mutex<Vec<(usize, f64)>>,
    }

    impl ProgressObserver for Recorder {
        fn indicator_moved(&self, update: &IndicatorUpdate) {
            self.indicator.lock().unwrap().push(update.clone());
        }

        fn segment_offset(&self, index: usize, dash_offset: f64) {
            self.segments.lock().unwrap().push((index, dash_offset));
        }
    }

    fn config_with_indicator(segments: usize, gap: f64) -> ProgressConfig {
        let mut config = ProgressConfig::new(100.0);
        config.segments = segments;
        config.segments_gap = gap;
        config.indicator = Some(IndicatorConfig {
            show: true,
            radius: 10.0,
            stroke_width: 3.0,
            ..Default::default()
        });
        config
    }

    fn finish(scheduler: &AnimationScheduler) {
        let mut frames = 0;
        while scheduler.advance(16.0) {
            frames += 1;
            assert!(frames < 10_000, "timeline never finished");
        }
    }

    #[test]
    fn test_end_to_end_four_segments() {
        let scheduler = AnimationScheduler::new();
        let mut config = ProgressConfig::new(100.0);
        config.segments = 4;
        let mut progress = SegmentedProgress::new(config, scheduler.handle());

        progress.run(75.0);
        let targets = progress.targets();
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().all(|t| (0.0..=25.0).contains(&t)));
        assert!((targets.sum() - 75.0).abs() < 1e-3);

        let pass = progress.render();
        assert_eq!(pass.arc_count(), 8);
        assert_eq!(pass.base_tracks.len(), 4);
        assert_eq!(pass.overlays.len(), 4);
        assert!(pass.indicator.is_none());

        finish(&scheduler);
        for (i, arc) in pass.overlays.iter().enumerate() {
            let expected = progress.layout().circumference * (1.0 - targets.get(i) / 100.0);
            assert!((arc.resolve(&scheduler) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_segments_fill_in_order() {
        let scheduler = AnimationScheduler::new();
        let mut progress = SegmentedProgress::new(ProgressConfig::new(100.0), scheduler.handle());

        progress.run(90.0);
        assert_eq!(progress.targets().as_slice(), &[33.3333, 33.3333, 23.3333]);

        // Initial delay, then half of the first segment
        scheduler.advance(10.0);
        assert_eq!(progress.segment_value(0), 0.0);
        scheduler.advance(200.0);
        assert!(progress.segment_value(0) > 16.0 && progress.segment_value(0) < 17.0);
        assert_eq!(progress.segment_value(1), 0.0);

        // First segment done, second under way, third untouched
        scheduler.advance(300.0);
        assert_eq!(progress.segment_value(0), 33.3333);
        assert!(progress.segment_value(1) > 0.0);
        assert_eq!(progress.segment_value(2), 0.0);

        finish(&scheduler);
        assert_eq!(progress.segment_value(1), 33.3333);
        assert_eq!(progress.segment_value(2), 23.3333);
        assert_eq!(progress.state(), ProgressState::Idle);
    }

    #[test]
    fn test_indicator_runs_in_parallel() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 0.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(90.0);
        scheduler.advance(10.0 + 540.0);
        // 540 of 1080 ms for the indicator, while segment 0 has finished
        assert!((progress.indicator_value() - 45.0).abs() < 1e-9);
        assert_eq!(progress.segment_value(0), 33.3333);

        finish(&scheduler);
        let updates = recorder.indicator.lock().unwrap();
        assert!(!updates.is_empty());
        let last = updates.last().unwrap();
        assert_eq!(last.label, "90%");
        assert_eq!(last.radius, 10.0);
        assert_eq!(last.label_position.y, last.position.y + 5.0);

        // Tip of 90% of the circle, starting at the top
        let layout = progress.layout();
        let expected = arc_endpoint(
            layout.radius,
            layout.circumference * 0.9,
            layout.half_circle,
            layout.half_circle,
            layout.rotation,
        );
        assert!(last.position.distance(expected) < 1e-9);
        assert!((last.position.distance(layout.center()) - layout.radius).abs() < 1e-9);
    }

    #[test]
    fn test_rerun_leaves_one_listener_set() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 0.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(40.0);
        scheduler.advance(100.0);
        progress.run(80.0);

        // One indicator listener plus one per segment
        assert_eq!(scheduler.listener_count(), 4);
        assert_eq!(scheduler.timeline_count(), 1);
        assert_eq!(progress.indicator_value(), 0.0);

        recorder.indicator.lock().unwrap().clear();
        finish(&scheduler);

        let updates = recorder.indicator.lock().unwrap();
        assert!(!updates.is_empty());
        assert!(updates.iter().all(|u| u.label == "80%"));
        assert_eq!(progress.indicator_value(), 80.0);
    }

    #[test]
    fn test_rapid_reruns() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(4, 2.0), scheduler.handle())
                .with_observer(recorder.clone());

        for p in [10.0, 95.0, 30.0, 60.0] {
            progress.run(p);
        }
        assert_eq!(scheduler.listener_count(), 5);
        assert_eq!(scheduler.timeline_count(), 1);

        finish(&scheduler);
        assert!(recorder
            .indicator
            .lock()
            .unwrap()
            .iter()
            .all(|u| u.label == "60%"));
    }

    #[test]
    fn test_missing_progress_still_runs_lifecycle() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 0.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(None);
        assert_eq!(progress.targets().as_slice(), &[0.0, 0.0, 0.0]);
        assert_eq!(progress.state(), ProgressState::Running);

        // Only the initial delay remains
        assert!(!scheduler.advance(10.0));
        assert_eq!(progress.state(), ProgressState::Idle);
        assert!(recorder.indicator.lock().unwrap().is_empty());
    }

    #[test]
    fn test_over_max_matches_max() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 0.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(150.0);
        assert_eq!(progress.targets(), &allocate(Some(100.0), 100.0, 3));
        finish(&scheduler);

        assert_eq!(progress.indicator_value(), 100.0);
        let updates = recorder.indicator.lock().unwrap();
        assert_eq!(updates.last().unwrap().label, "100%");
    }

    #[test]
    fn test_gap_holds_back_indicator() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 30.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(50.0);
        // mean gap = (50 / 2) * 3 * 30 / 100 = 22.5 of arc length
        scheduler.advance(10.0 + 12.0);
        // 1% of 628 is under the gap: no emission yet
        assert!(recorder.indicator.lock().unwrap().is_empty());

        finish(&scheduler);
        let updates = recorder.indicator.lock().unwrap();
        let layout = progress.layout();
        let expected = arc_endpoint(
            layout.radius,
            layout.circumference * 0.5 - 22.5,
            layout.half_circle,
            layout.half_circle,
            layout.rotation,
        );
        assert!(updates.last().unwrap().position.distance(expected) < 1e-9);
    }

    #[test]
    fn test_segment_offsets_reach_target() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 10.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(50.0);
        finish(&scheduler);

        let offsets = recorder.segments.lock().unwrap();
        let circ = progress.layout().circumference;
        for (index, target) in progress.targets().iter().enumerate() {
            let expected = stroke_offset(target, circ, 3, 10.0).resolve(target);
            let last = offsets.iter().rev().find(|(i, _)| *i == index).map(|(_, o)| *o);
            if target > 0.0 {
                assert!((last.unwrap() - expected).abs() < 1e-9);
            } else {
                // Zero-length segments are set to zero, staying hidden
                assert!(last.map_or(true, |o| o == circ));
            }
        }

        // Every emitted offset lies between the filled amount and fully hidden
        assert!(offsets.iter().all(|(_, o)| *o <= circ + 1e-9));
    }

    #[test]
    fn test_dispose_detaches_everything() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut progress =
            SegmentedProgress::new(config_with_indicator(3, 0.0), scheduler.handle())
                .with_observer(recorder.clone());

        progress.run(70.0);
        scheduler.advance(300.0);
        progress.dispose();

        assert_eq!(scheduler.listener_count(), 0);
        assert_eq!(scheduler.timeline_count(), 0);
        assert_eq!(progress.indicator_value(), 0.0);
        assert_eq!(progress.state(), ProgressState::Idle);

        let before = recorder.indicator.lock().unwrap().len();
        scheduler.advance(1000.0);
        assert_eq!(recorder.indicator.lock().unwrap().len(), before);
    }

    #[test]
    fn test_drop_releases_values() {
        let scheduler = AnimationScheduler::new();
        {
            let mut progress =
                SegmentedProgress::new(config_with_indicator(5, 0.0), scheduler.handle());
            progress.run(33.0);
            assert_eq!(scheduler.value_count(), 6);
        }
        assert_eq!(scheduler.value_count(), 0);
        assert_eq!(scheduler.listener_count(), 0);
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_degenerate_config_does_not_panic() {
        let scheduler = AnimationScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let mut config = config_with_indicator(0, 0.0);
        config.radius = 0.0;
        let mut progress =
            SegmentedProgress::new(config, scheduler.handle()).with_observer(recorder.clone());

        assert_eq!(progress.config().segments, 1);
        progress.run(60.0);
        finish(&scheduler);

        assert!(recorder.indicator.lock().unwrap().is_empty());
        assert_eq!(progress.render().arc_count(), 2);
    }

    #[test]
    fn test_render_before_run_is_unfilled() {
        let scheduler = AnimationScheduler::new();
        let progress = SegmentedProgress::with_center(
            config_with_indicator(3, 0.0),
            scheduler.handle(),
            "center",
        );

        let pass = progress.render();
        assert_eq!(pass.center, Some(&"center"));
        assert_eq!(pass.view_box, 2.0 * (100.0 + 10.0 + 10.0));
        assert_eq!(pass.height, 200.0);
        let circ = progress.layout().circumference;
        assert!(pass.overlays.iter().all(|arc| arc.resolve(&scheduler) == circ));
        assert!(pass.overlays.iter().all(|arc| arc.dash_offset().is_static()));

        let glyph = pass.indicator.unwrap();
        assert_eq!(glyph.fill, Color::WHITE);
        assert_eq!(glyph.stroke, progress.config().progress_color);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(None, 100.0), 0.0);
        assert_eq!(percent_of(Some(-3.0), 100.0), 0.0);
        assert_eq!(percent_of(Some(f64::NAN), 100.0), 0.0);
        assert_eq!(percent_of(Some(5.0), 10.0), 50.0);
        assert_eq!(percent_of(Some(500.0), 100.0), 100.0);
    }
}
