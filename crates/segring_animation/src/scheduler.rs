//! Animation scheduler
//!
//! Owns every animated value, its frame listeners and the running
//! timelines, and advances them when the host's frame clock ticks:
//! - `AnimatedValue` - a scalar registered with the scheduler
//! - `Animation` - a timing/sequence/parallel description, started as a timeline
//!
//! All mutation happens inside `advance()` (or an explicit setter), so the
//! scheduler never needs its own thread. Listeners run after the internal
//! lock is released; a listener removed earlier in the same frame is skipped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use rustc_hash::FxHashSet;
use segring_core::AnimationAccess;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::timeline::{Animation, Step, Timeline, Timing, ValueStore};

new_key_type! {
    /// Handle to a registered animated value
    pub struct ValueId;
    /// Handle to a registered frame listener
    pub struct ListenerId;
    /// Handle to a running timeline
    pub struct TimelineId;
}

impl ValueId {
    /// Convert to raw u64 for render-time lookups
    pub fn to_raw(self) -> u64 {
        self.0.as_ffi()
    }

    /// Reconstruct from raw u64 created by `to_raw()`
    pub fn from_raw(raw: u64) -> Self {
        ValueId::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Per-frame listener, called with the value's new value
pub type TickCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Called once when a timeline ends: `true` if it finished, `false` if stopped
pub type CompletionCallback = Box<dyn FnOnce(bool) + Send>;

struct ValueSlot {
    value: f64,
    listeners: SmallVec<[ListenerId; 4]>,
}

struct ListenerSlot {
    callback: TickCallback,
}

struct TimelineSlot {
    timeline: Timeline,
    on_complete: Option<CompletionCallback>,
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    values: SlotMap<ValueId, ValueSlot>,
    listeners: SlotMap<ListenerId, ListenerSlot>,
    timelines: SlotMap<TimelineId, TimelineSlot>,
    last_frame: Instant,
}

type Notification = (ListenerId, TickCallback, f64);

impl SchedulerInner {
    fn new() -> Self {
        Self {
            values: SlotMap::with_key(),
            listeners: SlotMap::with_key(),
            timelines: SlotMap::with_key(),
            last_frame: Instant::now(),
        }
    }

    fn notifications_for(&self, changed: &[ValueId]) -> Vec<Notification> {
        let mut out = Vec::new();
        for id in changed {
            let Some(slot) = self.values.get(*id) else {
                continue;
            };
            for listener in &slot.listeners {
                if let Some(entry) = self.listeners.get(*listener) {
                    out.push((*listener, Arc::clone(&entry.callback), slot.value));
                }
            }
        }
        out
    }

    /// Remove timelines matching `pred`, returning their completion callbacks
    fn take_timelines<F>(&mut self, mut pred: F) -> Vec<CompletionCallback>
    where
        F: FnMut(TimelineId, &Timeline) -> bool,
    {
        let ids: SmallVec<[TimelineId; 4]> = self
            .timelines
            .iter()
            .filter(|(id, slot)| pred(*id, &slot.timeline))
            .map(|(id, _)| id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.timelines.remove(id))
            .filter_map(|slot| slot.on_complete)
            .collect()
    }
}

/// Values touched during one frame, in first-touched order
struct FrameWriter<'a> {
    values: &'a mut SlotMap<ValueId, ValueSlot>,
    changed: Vec<ValueId>,
    seen: FxHashSet<ValueId>,
}

impl<'a> FrameWriter<'a> {
    fn new(values: &'a mut SlotMap<ValueId, ValueSlot>) -> Self {
        Self {
            values,
            changed: Vec::new(),
            seen: FxHashSet::default(),
        }
    }
}

impl ValueStore for FrameWriter<'_> {
    fn read(&self, id: ValueId) -> Option<f64> {
        self.values.get(id).map(|slot| slot.value)
    }

    fn write(&mut self, id: ValueId, value: f64) {
        if let Some(slot) = self.values.get_mut(id) {
            slot.value = value;
            if self.seen.insert(id) {
                self.changed.push(id);
            }
        }
    }
}

fn lock(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Invoke listeners outside the lock, skipping any removed in the meantime
fn dispatch(inner: &Mutex<SchedulerInner>, notifications: Vec<Notification>) {
    for (id, callback, value) in notifications {
        if !lock(inner).listeners.contains_key(id) {
            continue;
        }
        callback(value);
    }
}

fn complete(callbacks: Vec<CompletionCallback>, finished: bool) {
    for callback in callbacks {
        callback(finished);
    }
}

/// The animation scheduler that advances all running timelines
///
/// Held by the host; components receive a [`SchedulerHandle`].
///
/// ```ignore
/// let scheduler = AnimationScheduler::new();
/// let progress = SegmentedProgress::new(config, scheduler.handle());
///
/// // Once per frame
/// scheduler.tick();
/// ```
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner::new())),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Advance by the wall-clock time since the previous frame
    ///
    /// Returns true if any timelines are still running.
    pub fn tick(&self) -> bool {
        let dt_ms = {
            let mut inner = lock(&self.inner);
            let now = Instant::now();
            let dt = (now - inner.last_frame).as_secs_f64() * 1000.0;
            inner.last_frame = now;
            dt
        };
        self.advance(dt_ms)
    }

    /// Advance all running timelines by `dt_ms`
    ///
    /// Finished timelines are removed and their completion callbacks invoked
    /// after the frame's listeners. Returns true if any are still running.
    pub fn advance(&self, dt_ms: f64) -> bool {
        let (notifications, completions, active) = {
            let mut guard = lock(&self.inner);
            let inner = &mut *guard;

            let mut writer = FrameWriter::new(&mut inner.values);
            let mut finished: SmallVec<[TimelineId; 4]> = SmallVec::new();
            for (id, slot) in inner.timelines.iter_mut() {
                if let Step::Finished { .. } = slot.timeline.advance(dt_ms, &mut writer) {
                    finished.push(id);
                }
            }
            let changed = writer.changed;

            let completions = inner.take_timelines(|id, _| finished.contains(&id));
            if !finished.is_empty() {
                tracing::trace!("{} timeline(s) finished", finished.len());
            }

            (
                inner.notifications_for(&changed),
                completions,
                !inner.timelines.is_empty(),
            )
        };

        dispatch(&self.inner, notifications);
        complete(completions, true);
        active
    }

    /// Check if any timelines are still running
    pub fn has_active_animations(&self) -> bool {
        !lock(&self.inner).timelines.is_empty()
    }

    /// Start a timeline; see [`SchedulerHandle::start_timeline`]
    pub fn start_timeline(
        &self,
        animation: Animation,
        on_complete: Option<CompletionCallback>,
    ) -> Option<TimelineId> {
        self.handle().start_timeline(animation, on_complete)
    }

    /// Get the number of registered animated values
    pub fn value_count(&self) -> usize {
        lock(&self.inner).values.len()
    }

    /// Get the number of registered listeners across all values
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    /// Get the number of running timelines
    pub fn timeline_count(&self) -> usize {
        lock(&self.inner).timelines.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationAccess for AnimationScheduler {
    fn animated_value(&self, id: u64) -> Option<f64> {
        lock(&self.inner)
            .values
            .get(ValueId::from_raw(id))
            .map(|slot| slot.value)
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped; every operation on a
/// dead handle is a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    // =========================================================================
    // Value Operations
    // =========================================================================

    /// Register an animated value and return its ID
    pub fn register_value(&self, initial: f64) -> Option<ValueId> {
        self.inner.upgrade().map(|inner| {
            lock(&inner).values.insert(ValueSlot {
                value: initial,
                listeners: SmallVec::new(),
            })
        })
    }

    /// Get the current value
    pub fn value(&self, id: ValueId) -> Option<f64> {
        self.inner
            .upgrade()
            .and_then(|inner| lock(&inner).values.get(id).map(|slot| slot.value))
    }

    /// Set a value immediately and notify its listeners
    ///
    /// Does not stop timelines driving the value.
    pub fn set_value(&self, id: ValueId, value: f64) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let notifications = {
            let mut guard = lock(&inner);
            match guard.values.get_mut(id) {
                Some(slot) => slot.value = value,
                None => return,
            }
            guard.notifications_for(&[id])
        };
        dispatch(&inner, notifications);
    }

    /// Remove a value, its listeners, and stop timelines driving it
    pub fn remove_value(&self, id: ValueId) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let completions = {
            let mut guard = lock(&inner);
            if let Some(slot) = guard.values.remove(id) {
                for listener in slot.listeners {
                    guard.listeners.remove(listener);
                }
            }
            guard.take_timelines(|_, timeline| timeline.drives(id))
        };
        complete(completions, false);
    }

    // =========================================================================
    // Listener Operations
    // =========================================================================

    /// Register a per-frame listener on a value
    pub fn add_listener<F>(&self, id: ValueId, callback: F) -> Option<ListenerId>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let inner = self.inner.upgrade()?;
        let mut guard = lock(&inner);
        if !guard.values.contains_key(id) {
            return None;
        }
        let listener = guard.listeners.insert(ListenerSlot {
            callback: Arc::new(callback),
        });
        if let Some(slot) = guard.values.get_mut(id) {
            slot.listeners.push(listener);
        }
        Some(listener)
    }

    /// Detach one listener from a value
    pub fn remove_listener(&self, id: ValueId, listener: ListenerId) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = lock(&inner);
            if let Some(slot) = guard.values.get_mut(id) {
                slot.listeners.retain(|l| *l != listener);
            }
            guard.listeners.remove(listener);
        }
    }

    /// Detach every listener registered on a value
    pub fn remove_all_listeners(&self, id: ValueId) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = lock(&inner);
            let removed = match guard.values.get_mut(id) {
                Some(slot) => std::mem::take(&mut slot.listeners),
                None => return,
            };
            for listener in removed {
                guard.listeners.remove(listener);
            }
        }
    }

    /// Number of listeners registered on a value
    pub fn listener_count(&self, id: ValueId) -> usize {
        self.inner
            .upgrade()
            .and_then(|inner| lock(&inner).values.get(id).map(|slot| slot.listeners.len()))
            .unwrap_or(0)
    }

    // =========================================================================
    // Timeline Operations
    // =========================================================================

    /// Start a timeline and return its ID
    ///
    /// The first frame is applied on the next `advance()`.
    pub fn start_timeline(
        &self,
        animation: Animation,
        on_complete: Option<CompletionCallback>,
    ) -> Option<TimelineId> {
        self.inner.upgrade().map(|inner| {
            let mut guard = lock(&inner);
            // Prevent a huge dt on the first wall-clock tick
            guard.last_frame = Instant::now();
            guard.timelines.insert(TimelineSlot {
                timeline: Timeline::new(animation),
                on_complete,
            })
        })
    }

    /// Check if a timeline is still running
    pub fn is_timeline_playing(&self, id: TimelineId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| lock(&inner).timelines.contains_key(id))
            .unwrap_or(false)
    }

    /// Stop a timeline, leaving its values where they are
    pub fn stop_timeline(&self, id: TimelineId) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let completions = lock(&inner).take_timelines(|tid, _| tid == id);
        complete(completions, false);
    }

    /// Stop every timeline driving a value
    ///
    /// Returns the number of timelines stopped.
    pub fn stop_animation(&self, id: ValueId) -> usize {
        let Some(inner) = self.inner.upgrade() else {
            return 0;
        };
        let completions = lock(&inner).take_timelines(|_, timeline| timeline.drives(id));
        let count = completions.len();
        complete(completions, false);
        count
    }

    /// Check if any running timeline drives a value
    pub fn is_value_animating(&self, id: ValueId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| {
                lock(&inner)
                    .timelines
                    .values()
                    .any(|slot| slot.timeline.drives(id))
            })
            .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl AnimationAccess for SchedulerHandle {
    fn animated_value(&self, id: u64) -> Option<f64> {
        self.value(ValueId::from_raw(id))
    }
}

// ============================================================================
// Animated Value
// ============================================================================

/// A scalar registered with the scheduler
///
/// Dropping it unregisters the value, detaches its listeners and stops any
/// timeline driving it.
///
/// # Example
///
/// ```ignore
/// let value = AnimatedValue::new(scheduler.handle(), 0.0);
/// value.add_listener(|v| println!("now {v}"));
/// scheduler.start_timeline(value.timing(100.0, 1200.0).into(), None);
/// ```
pub struct AnimatedValue {
    handle: SchedulerHandle,
    id: Option<ValueId>,
}

impl AnimatedValue {
    /// Register a new value; inert if the scheduler is gone
    pub fn new(handle: SchedulerHandle, initial: f64) -> Self {
        let id = handle.register_value(initial);
        Self { handle, id }
    }

    pub fn id(&self) -> Option<ValueId> {
        self.id
    }

    /// Raw id for render-time resolution through [`AnimationAccess`]
    pub fn raw_id(&self) -> u64 {
        self.id.map(ValueId::to_raw).unwrap_or_default()
    }

    /// Current value, zero when the scheduler is gone
    pub fn get(&self) -> f64 {
        self.id
            .and_then(|id| self.handle.value(id))
            .unwrap_or(0.0)
    }

    pub fn set_value(&self, value: f64) {
        if let Some(id) = self.id {
            self.handle.set_value(id, value);
        }
    }

    pub fn add_listener<F>(&self, callback: F) -> Option<ListenerId>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.id.and_then(|id| self.handle.add_listener(id, callback))
    }

    pub fn remove_listener(&self, listener: ListenerId) {
        if let Some(id) = self.id {
            self.handle.remove_listener(id, listener);
        }
    }

    pub fn remove_all_listeners(&self) {
        if let Some(id) = self.id {
            self.handle.remove_all_listeners(id);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.id
            .map(|id| self.handle.listener_count(id))
            .unwrap_or(0)
    }

    /// Halt every timeline driving this value
    pub fn stop_animation(&self) {
        if let Some(id) = self.id {
            self.handle.stop_animation(id);
        }
    }

    pub fn is_animating(&self) -> bool {
        self.id
            .map(|id| self.handle.is_value_animating(id))
            .unwrap_or(false)
    }

    /// Timing transition of this value, for composing timelines
    ///
    /// An inert value yields a transition that finishes immediately.
    pub fn timing(&self, to: f64, duration_ms: f64) -> Timing {
        Timing::new(self.id.unwrap_or_default(), to, duration_ms)
    }
}

impl Drop for AnimatedValue {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.handle.remove_value(id);
        }
    }
}
