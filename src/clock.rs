//! Shared frame clock that drives every running animation.
//!
//! The clock owns no animation state. It holds a list of tick callbacks and
//! fires each of them once per tick. The host event loop supplies time by
//! calling [`FrameClock::poll`] (or [`FrameClock::tick`] directly), so the
//! clock never blocks or spawns threads.
//!
//! The process-wide instance is created lazily, per UI thread, on the first
//! call to [`FrameClock::instance`] and is torn down when that thread exits.
//! Components that need isolation (tests, embedded hosts) can construct their
//! own clock and inject it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

thread_local! {
    static GLOBAL_CLOCK: Rc<FrameClock> = Rc::new(FrameClock::new());
}

/// Handle returned by [`FrameClock::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type TickFn = Rc<dyn Fn()>;

/// A periodic tick source shared by many animations.
///
/// The timer counts as running exactly while at least one subscriber exists.
pub struct FrameClock {
    interval: Duration,
    subscribers: RefCell<Vec<(SubscriptionId, TickFn)>>,
    next_id: Cell<u64>,
    last_tick: Cell<Option<Instant>>,
    ticks: Cell<u64>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Tick interval of the shared clock (roughly 60 Hz).
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(17);

    /// Creates a detached clock ticking at [`DEFAULT_INTERVAL`](Self::DEFAULT_INTERVAL).
    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    /// Creates a detached clock with a custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            last_tick: Cell::new(None),
            ticks: Cell::new(0),
        }
    }

    /// Returns the shared clock for the current UI thread.
    pub fn instance() -> Rc<FrameClock> {
        GLOBAL_CLOCK.with(Rc::clone)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Registers a callback invoked once per tick.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Removes a callback. Unknown ids are ignored.
    ///
    /// Returns true if the subscription existed. Takes effect immediately,
    /// including for the remainder of a tick that is currently being fired.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            let before = subscribers.len();
            subscribers.retain(|(sub, _)| *sub != id);
            before != subscribers.len()
        };
        if !self.is_running() {
            self.last_tick.set(None);
        }
        removed
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow().iter().any(|(sub, _)| *sub == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Returns true while at least one subscriber exists.
    pub fn is_running(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Total number of ticks fired by this clock.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Fires one tick to every current subscriber.
    ///
    /// Callbacks may subscribe or unsubscribe re-entrantly. Subscribers added
    /// during a tick are first notified on the next one; subscribers removed
    /// during a tick are not notified again.
    pub fn tick(&self) {
        let snapshot: Vec<(SubscriptionId, TickFn)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(id, f)| (*id, Rc::clone(f)))
            .collect();

        self.ticks.set(self.ticks.get() + 1);
        trace!(subscribers = snapshot.len(), tick = self.ticks.get(), "frame clock tick");

        for (id, listener) in snapshot {
            if self.is_subscribed(id) {
                listener();
            }
        }
    }

    /// Advances the timer to `now`, firing at most one tick.
    ///
    /// Behaves like a coalescing UI timer: if the host stalls for several
    /// intervals, a single tick is fired and the phase restarts at `now`.
    /// Returns true if a tick fired.
    pub fn poll(&self, now: Instant) -> bool {
        if !self.is_running() {
            self.last_tick.set(None);
            return false;
        }

        match self.last_tick.get() {
            None => {
                self.last_tick.set(Some(now));
                false
            }
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                self.last_tick.set(Some(now));
                self.tick();
                true
            }
            Some(_) => false,
        }
    }
}
