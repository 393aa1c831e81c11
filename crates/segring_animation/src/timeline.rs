//! Timeline composition
//!
//! An [`Animation`] describes how values move over time:
//! - `Timing` - move one value to a target over a duration, after a delay
//! - `Sequence` - run children one after another, in order
//! - `Parallel` - run children together; done when all are done
//!
//! Once started, the description is compiled into a [`Timeline`] that the
//! scheduler advances every frame. Frame time left over when a step
//! finishes carries into the next step of a sequence, so a chain of short
//! transitions does not drift behind the clock.

use segring_core::Easing;
use smallvec::SmallVec;

use crate::scheduler::ValueId;

/// A single timed transition of one animated value
#[derive(Clone, Debug, PartialEq)]
pub struct Timing {
    pub value: ValueId,
    pub to: f64,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
}

impl Timing {
    pub fn new(value: ValueId, to: f64, duration_ms: f64) -> Self {
        Self {
            value,
            to,
            duration_ms,
            delay_ms: 0.0,
            easing: Easing::Linear,
        }
    }

    /// Wait before starting (builder pattern)
    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the easing curve (builder pattern)
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Declarative description of a timeline
#[derive(Clone, Debug, PartialEq)]
pub enum Animation {
    Timing(Timing),
    Sequence(Vec<Animation>),
    Parallel(Vec<Animation>),
}

impl From<Timing> for Animation {
    fn from(timing: Timing) -> Self {
        Animation::Timing(timing)
    }
}

impl Animation {
    pub fn sequence(children: impl IntoIterator<Item = Animation>) -> Self {
        Animation::Sequence(children.into_iter().collect())
    }

    pub fn parallel(children: impl IntoIterator<Item = Animation>) -> Self {
        Animation::Parallel(children.into_iter().collect())
    }

    /// Time from start to finish, delays included
    pub fn total_duration_ms(&self) -> f64 {
        match self {
            Animation::Timing(t) => t.delay_ms.max(0.0) + t.duration_ms.max(0.0),
            Animation::Sequence(children) => children.iter().map(Self::total_duration_ms).sum(),
            Animation::Parallel(children) => children
                .iter()
                .map(Self::total_duration_ms)
                .fold(0.0, f64::max),
        }
    }

    /// Every value this animation drives, without duplicates
    pub fn values(&self) -> SmallVec<[ValueId; 8]> {
        let mut out = SmallVec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values(&self, out: &mut SmallVec<[ValueId; 8]>) {
        match self {
            Animation::Timing(t) => {
                if !out.contains(&t.value) {
                    out.push(t.value);
                }
            }
            Animation::Sequence(children) | Animation::Parallel(children) => {
                for child in children {
                    child.collect_values(out);
                }
            }
        }
    }
}

/// Read/write access to animated values while a timeline advances
pub(crate) trait ValueStore {
    fn read(&self, id: ValueId) -> Option<f64>;
    fn write(&mut self, id: ValueId, value: f64);
}

/// Outcome of advancing a node by one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    Running,
    /// Done, with this much of the frame left unused
    Finished { leftover: f64 },
}

enum Node {
    Timing {
        timing: Timing,
        elapsed: f64,
        from: Option<f64>,
        done: bool,
    },
    Sequence {
        children: Vec<Node>,
        current: usize,
    },
    Parallel {
        children: Vec<Node>,
    },
}

impl Node {
    fn build(animation: Animation) -> Self {
        match animation {
            Animation::Timing(timing) => Node::Timing {
                timing,
                elapsed: 0.0,
                from: None,
                done: false,
            },
            Animation::Sequence(children) => Node::Sequence {
                children: children.into_iter().map(Node::build).collect(),
                current: 0,
            },
            Animation::Parallel(children) => Node::Parallel {
                children: children.into_iter().map(Node::build).collect(),
            },
        }
    }

    fn advance<S: ValueStore>(&mut self, dt: f64, store: &mut S) -> Step {
        match self {
            Node::Timing {
                timing,
                elapsed,
                from,
                done,
            } => {
                if *done {
                    return Step::Finished { leftover: dt };
                }
                *elapsed += dt;
                if *elapsed < timing.delay_ms {
                    return Step::Running;
                }
                let active = *elapsed - timing.delay_ms.max(0.0);

                // Value dropped mid-flight: nothing left to drive
                let Some(current) = store.read(timing.value) else {
                    *done = true;
                    return Step::Finished { leftover: active };
                };
                let start = *from.get_or_insert(current);

                if timing.duration_ms <= 0.0 || active >= timing.duration_ms {
                    store.write(timing.value, timing.to);
                    *done = true;
                    return Step::Finished {
                        leftover: active - timing.duration_ms.max(0.0),
                    };
                }

                let t = timing.easing.apply(active / timing.duration_ms);
                store.write(timing.value, start + (timing.to - start) * t);
                Step::Running
            }
            Node::Sequence { children, current } => {
                let mut dt = dt;
                while let Some(child) = children.get_mut(*current) {
                    match child.advance(dt, store) {
                        Step::Running => return Step::Running,
                        Step::Finished { leftover } => {
                            *current += 1;
                            dt = leftover;
                        }
                    }
                }
                Step::Finished { leftover: dt }
            }
            Node::Parallel { children } => {
                let mut leftover = dt;
                let mut running = false;
                for child in children.iter_mut() {
                    match child.advance(dt, store) {
                        Step::Running => running = true,
                        Step::Finished { leftover: l } => leftover = leftover.min(l),
                    }
                }
                if running {
                    Step::Running
                } else {
                    Step::Finished { leftover }
                }
            }
        }
    }
}

/// A started animation, advanced frame by frame
pub(crate) struct Timeline {
    root: Node,
    values: SmallVec<[ValueId; 8]>,
}

impl Timeline {
    pub(crate) fn new(animation: Animation) -> Self {
        let values = animation.values();
        Self {
            root: Node::build(animation),
            values,
        }
    }

    /// Whether this timeline drives the given value
    pub(crate) fn drives(&self, id: ValueId) -> bool {
        self.values.contains(&id)
    }

    pub(crate) fn advance<S: ValueStore>(&mut self, dt_ms: f64, store: &mut S) -> Step {
        self.root.advance(dt_ms.max(0.0), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[derive(Default)]
    struct Store {
        values: SlotMap<ValueId, f64>,
        writes: Vec<(ValueId, f64)>,
    }

    impl ValueStore for Store {
        fn read(&self, id: ValueId) -> Option<f64> {
            self.values.get(id).copied()
        }

        fn write(&mut self, id: ValueId, value: f64) {
            if let Some(slot) = self.values.get_mut(id) {
                *slot = value;
                self.writes.push((id, value));
            }
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_timing_with_delay() {
        let mut store = Store::default();
        let v = store.values.insert(0.0);
        let mut timeline = Timeline::new(Timing::new(v, 100.0, 1000.0).delay(10.0).into());

        assert_eq!(timeline.advance(5.0, &mut store), Step::Running);
        assert_eq!(store.values[v], 0.0);

        assert_eq!(timeline.advance(255.0, &mut store), Step::Running);
        assert!(approx(store.values[v], 25.0));

        assert_eq!(
            timeline.advance(800.0, &mut store),
            Step::Finished { leftover: 50.0 }
        );
        assert_eq!(store.values[v], 100.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut store = Store::default();
        let v = store.values.insert(7.0);
        let mut timeline = Timeline::new(Timing::new(v, 0.0, 0.0).into());

        assert_eq!(
            timeline.advance(0.0, &mut store),
            Step::Finished { leftover: 0.0 }
        );
        assert_eq!(store.values[v], 0.0);
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let mut store = Store::default();
        let a = store.values.insert(0.0);
        let b = store.values.insert(0.0);
        let mut timeline = Timeline::new(Animation::sequence([
            Timing::new(a, 10.0, 100.0).into(),
            Timing::new(b, 20.0, 100.0).into(),
        ]));

        timeline.advance(50.0, &mut store);
        assert!(approx(store.values[a], 5.0));
        assert_eq!(store.values[b], 0.0);
        assert!(store.writes.iter().all(|(id, _)| *id == a));

        // Leftover time from `a` flows into `b`
        timeline.advance(75.0, &mut store);
        assert_eq!(store.values[a], 10.0);
        assert!(approx(store.values[b], 5.0));

        assert_eq!(
            timeline.advance(100.0, &mut store),
            Step::Finished { leftover: 25.0 }
        );
        assert_eq!(store.values[b], 20.0);
    }

    #[test]
    fn test_sequence_skips_through_empty_steps() {
        let mut store = Store::default();
        let a = store.values.insert(0.0);
        let b = store.values.insert(0.0);
        let c = store.values.insert(0.0);
        let mut timeline = Timeline::new(Animation::sequence([
            Timing::new(a, 0.0, 0.0).delay(10.0).into(),
            Timing::new(b, 0.0, 0.0).into(),
            Timing::new(c, 0.0, 0.0).into(),
        ]));

        assert_eq!(timeline.advance(5.0, &mut store), Step::Running);
        assert_eq!(
            timeline.advance(5.0, &mut store),
            Step::Finished { leftover: 0.0 }
        );
    }

    #[test]
    fn test_parallel_waits_for_longest() {
        let mut store = Store::default();
        let a = store.values.insert(0.0);
        let b = store.values.insert(0.0);
        let animation = Animation::parallel([
            Timing::new(a, 1.0, 100.0).into(),
            Timing::new(b, 1.0, 300.0).into(),
        ]);
        assert_eq!(animation.total_duration_ms(), 300.0);
        let mut timeline = Timeline::new(animation);

        assert_eq!(timeline.advance(150.0, &mut store), Step::Running);
        assert_eq!(store.values[a], 1.0);
        assert!(approx(store.values[b], 0.5));

        assert_eq!(
            timeline.advance(200.0, &mut store),
            Step::Finished { leftover: 50.0 }
        );
    }

    #[test]
    fn test_starts_from_current_value() {
        let mut store = Store::default();
        let v = store.values.insert(40.0);
        let mut timeline = Timeline::new(Timing::new(v, 60.0, 100.0).into());

        timeline.advance(50.0, &mut store);
        assert!(approx(store.values[v], 50.0));
    }

    #[test]
    fn test_dropped_value_finishes() {
        let mut store = Store::default();
        let v = store.values.insert(0.0);
        let mut timeline = Timeline::new(Timing::new(v, 1.0, 100.0).into());
        store.values.remove(v);

        assert!(matches!(
            timeline.advance(10.0, &mut store),
            Step::Finished { .. }
        ));
    }

    #[test]
    fn test_values_are_deduplicated() {
        let mut store = Store::default();
        let a = store.values.insert(0.0);
        let b = store.values.insert(0.0);
        let animation = Animation::sequence([
            Timing::new(a, 1.0, 1.0).into(),
            Animation::parallel([Timing::new(b, 1.0, 1.0).into(), Timing::new(a, 0.0, 1.0).into()]),
        ]);
        assert_eq!(animation.values().as_slice(), &[a, b]);

        let timeline = Timeline::new(animation);
        assert!(timeline.drives(a) && timeline.drives(b));
    }

    #[test]
    fn test_eased_timing() {
        let mut store = Store::default();
        let v = store.values.insert(0.0);
        let mut timeline = Timeline::new(
            Timing::new(v, 100.0, 100.0)
                .easing(Easing::EaseIn)
                .into(),
        );

        timeline.advance(50.0, &mut store);
        assert!(approx(store.values[v], 25.0));
    }
}
