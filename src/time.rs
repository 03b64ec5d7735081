//! Simulation time and one-shot timers.
//!
//! Time only moves when the host reports a frame delta, which keeps staggered
//! line insertions deterministic and lets tests drive them with fixed steps.
//!
//! # Example
//!
//! ```ignore
//! use starchain::time::{SimClock, TimerQueue};
//!
//! let mut clock = SimClock::new();
//! let mut timers = TimerQueue::new();
//! timers.schedule(clock.elapsed() + 0.15, "second edge");
//!
//! clock.advance(1.0 / 60.0);
//! for payload in timers.drain_due(clock.elapsed()) {
//!     println!("fired: {payload}");
//! }
//! ```

/// Accumulated simulation time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimClock {
    /// Total elapsed seconds. Kept in f64 so long sessions don't lose precision
    /// when compared against timer deadlines.
    elapsed: f64,
    /// Frames advanced so far.
    frame: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta` seconds. Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, delta: f32) -> f64 {
        if delta.is_finite() && delta > 0.0 {
            self.elapsed += delta as f64;
        }
        self.frame += 1;
        self.elapsed
    }

    /// Total elapsed seconds.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frames advanced so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// A timer waiting to fire.
#[derive(Clone, Debug, PartialEq)]
pub struct Timer<T> {
    /// Absolute simulation time in seconds.
    pub fire_at: f64,
    pub payload: T,
    /// Scheduling order, used to break ties between equal deadlines.
    order: u64,
}

/// One-shot timers keyed on simulation time.
///
/// Timers cannot be cancelled individually; [`cancel_all`](Self::cancel_all)
/// drops everything still pending, which is how an owner tears itself down.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
    next_order: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_order: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `payload` once the clock reaches `fire_at`.
    pub fn schedule(&mut self, fire_at: f64, payload: T) {
        let order = self.next_order;
        self.next_order += 1;
        self.timers.push(Timer {
            fire_at,
            payload,
            order,
        });
    }

    /// Remove and return every payload due at `now`, earliest deadline first.
    /// Equal deadlines fire in scheduling order.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        if !self.timers.iter().any(|t| t.fire_at <= now) {
            return Vec::new();
        }

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.fire_at <= now);
        self.timers = pending;

        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at).then(a.order.cmp(&b.order)));
        due.into_iter().map(|t| t.payload).collect()
    }

    /// Drop every pending timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Pending timers in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = &Timer<T>> {
        self.timers.iter()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
