//! Line animation sequencing.
//!
//! A chain becomes one [`LineAnimation`] per edge. Lines are inserted on a
//! stagger (edge `i` after `i * stagger`), drawn strictly one at a time in
//! insertion order, held at full opacity for `fade_start` seconds and then
//! faded out and dropped.
//!
//! # Line lifecycle
//!
//! | State | Condition | Per tick |
//! |-------|-----------|----------|
//! | [`LineState::Scheduled`] | inserted, `progress == 0` | waits for the cursor |
//! | [`LineState::Drawing`] | `0 < progress < 1` | `progress += dt * line_speed` |
//! | [`LineState::Holding`] | `progress == 1`, `age < fade_start` | `age += dt` |
//! | [`LineState::Fading`] | `age >= fade_start` | `opacity -= dt * fade_rate` |
//! | [`LineState::Removed`] | `opacity <= 0` | filtered out |
//!
//! # Drawing cursor
//!
//! Every inserted line gets a sequence number. The cursor holds the sequence
//! number of the next line allowed to draw, and the line being drawn is the
//! first live line whose number is at or past the cursor. Lines from several
//! chains share the one cursor, so overlapping chains take turns in insertion
//! order. Lines whose endpoints no longer resolve are expired on the spot and
//! the cursor simply moves past them.

use crate::chain::Chain;
use crate::config::BackgroundConfig;
use crate::field::{PointField, PointId};
use crate::time::{SimClock, Timer, TimerQueue};
use glam::Vec3;
use std::time::Duration;

/// Speeds and thresholds driving a line through its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineTiming {
    /// Progress per second while drawing.
    pub line_speed: f32,
    /// Seconds a finished line holds before fading.
    pub fade_start: f32,
    /// Opacity per second lost while fading.
    pub fade_rate: f32,
}

impl Default for LineTiming {
    fn default() -> Self {
        Self {
            line_speed: 2.0,
            fade_start: 10.0,
            fade_rate: 0.3,
        }
    }
}

/// Lifecycle stage of a [`LineAnimation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineState {
    Scheduled,
    Drawing,
    Holding,
    Fading,
    Removed,
}

/// One animated segment between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct LineAnimation {
    seq: u64,
    from: PointId,
    to: PointId,
    progress: f32,
    opacity: f32,
    age: f32,
}

impl LineAnimation {
    fn new(seq: u64, from: PointId, to: PointId) -> Self {
        Self {
            seq,
            from,
            to,
            progress: 0.0,
            opacity: 1.0,
            age: 0.0,
        }
    }

    /// Insertion order across all chains.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[inline]
    pub fn from(&self) -> PointId {
        self.from
    }

    #[inline]
    pub fn to(&self) -> PointId {
        self.to
    }

    /// Drawn fraction of the segment, 0 to 1.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Seconds since the line finished drawing.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn state(&self, timing: &LineTiming) -> LineState {
        if self.opacity <= 0.0 {
            LineState::Removed
        } else if self.progress >= 1.0 {
            if self.age >= timing.fade_start {
                LineState::Fading
            } else {
                LineState::Holding
            }
        } else if self.progress > 0.0 {
            LineState::Drawing
        } else {
            LineState::Scheduled
        }
    }

    /// Age a completed line and fade it once it is past `fade_start`.
    fn age_by(&mut self, dt: f32, timing: &LineTiming) {
        self.age += dt;
        if self.age >= timing.fade_start {
            self.opacity = (self.opacity - dt * timing.fade_rate).max(0.0);
        }
    }
}

/// A staggered line insertion that has not fired yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingLine {
    pub from: PointId,
    pub to: PointId,
    /// Offset from the moment the chain was scheduled.
    pub delay: Duration,
}

/// A drawable segment with live endpoint positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub from: PointId,
    pub to: PointId,
    /// Position of the `from` point.
    pub start: Vec3,
    /// `start` interpolated toward the `to` point by the line's progress.
    pub end: Vec3,
    pub opacity: f32,
}

/// Owns all active and pending line animations.
#[derive(Clone, Debug)]
pub struct Sequencer {
    timing: LineTiming,
    stagger: Duration,
    clock: SimClock,
    pending: TimerQueue<PendingLine>,
    lines: Vec<LineAnimation>,
    next_seq: u64,
    cursor: u64,
}

impl Sequencer {
    pub fn new(timing: LineTiming, stagger: Duration) -> Self {
        Self {
            timing,
            stagger,
            clock: SimClock::new(),
            pending: TimerQueue::new(),
            lines: Vec::new(),
            next_seq: 0,
            cursor: 0,
        }
    }

    pub fn from_config(config: &BackgroundConfig) -> Self {
        Self::new(
            LineTiming {
                line_speed: config.line_speed,
                fade_start: config.fade_start,
                fade_rate: config.fade_rate,
            },
            config.stagger(),
        )
    }

    /// Queue one line per edge of `chain` using the configured stagger.
    /// Returns the number of lines queued.
    pub fn schedule_chain(&mut self, chain: &Chain) -> usize {
        self.schedule_chain_with(chain, self.stagger)
    }

    /// Queue one line per edge, edge `i` firing `i * stagger` from now.
    pub fn schedule_chain_with(&mut self, chain: &Chain, stagger: Duration) -> usize {
        let now = self.clock.elapsed();
        let mut count = 0;

        for (i, (from, to)) in chain.edges().enumerate() {
            let delay = stagger * i as u32;
            self.pending
                .schedule(now + delay.as_secs_f64(), PendingLine { from, to, delay });
            count += 1;
        }

        if count > 0 {
            log::debug!("Scheduled {} lines, {:?} apart", count, stagger);
        }
        count
    }

    /// Advance every line by `dt` seconds.
    ///
    /// Fires due insertions, advances at most one line's progress, ages every
    /// completed line and drops the ones that have faded out. Lines whose
    /// endpoints no longer resolve in `field` are expired.
    pub fn tick(&mut self, dt: f32, field: &PointField) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let now = self.clock.advance(dt);

        for pending in self.pending.drain_due(now) {
            self.lines.push(LineAnimation::new(self.next_seq, pending.from, pending.to));
            self.next_seq += 1;
        }

        let timing = self.timing;
        let mut drew = false;

        for line in &mut self.lines {
            if !(field.contains(line.from) && field.contains(line.to)) {
                line.opacity = 0.0;
                continue;
            }

            if !drew && line.seq >= self.cursor {
                drew = true;
                self.cursor = line.seq;
                line.progress = (line.progress + dt * timing.line_speed).min(1.0);
                if line.progress >= 1.0 {
                    self.cursor = line.seq + 1;
                }
            }

            if line.progress >= 1.0 {
                line.age_by(dt, &timing);
            }
        }

        self.lines.retain(|line| line.opacity > 0.0);
    }

    /// Active lines in insertion order.
    pub fn lines(&self) -> &[LineAnimation] {
        &self.lines
    }

    /// Insertions still waiting for their stagger delay.
    pub fn pending(&self) -> impl Iterator<Item = &Timer<PendingLine>> {
        self.pending.iter()
    }

    /// The line that will advance on the next tick, if one is inserted.
    pub fn current(&self) -> Option<&LineAnimation> {
        self.lines
            .iter()
            .find(|line| line.seq >= self.cursor && line.opacity > 0.0)
    }

    pub fn state_of(&self, line: &LineAnimation) -> LineState {
        line.state(&self.timing)
    }

    /// Visible segments with endpoints read from `field`.
    ///
    /// Lines that have not started drawing or whose endpoints are gone are skipped.
    pub fn segments<'a>(&'a self, field: &'a PointField) -> impl Iterator<Item = LineSegment> + 'a {
        self.lines.iter().filter_map(move |line| {
            if line.progress <= 0.0 || line.opacity <= 0.0 {
                return None;
            }
            let start = field.position(line.from)?;
            let target = field.position(line.to)?;
            Some(LineSegment {
                from: line.from,
                to: line.to,
                start,
                end: start.lerp(target, line.progress),
                opacity: line.opacity,
            })
        })
    }

    /// Drop every line and cancel every pending insertion.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.pending.cancel_all();
        self.cursor = self.next_seq;
    }

    /// No active lines and nothing pending.
    pub fn is_idle(&self) -> bool {
        self.lines.is_empty() && self.pending.is_empty()
    }

    pub fn timing(&self) -> &LineTiming {
        &self.timing
    }

    /// Simulation time seen by this sequencer, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(LineTiming::default(), Duration::from_millis(150))
    }
}
