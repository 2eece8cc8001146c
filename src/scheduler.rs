//! Delayed delivery of flip lifecycle timers.
//!
//! The controller never sleeps. It asks a [`Scheduler`] to hand a [`Timer`]
//! back after a delay, and whoever drives the controller feeds fired timers
//! into `GameController::on_timer`.

use std::{
    fmt,
    time::Duration,
};
use tokio::sync::mpsc::{
    self,
    UnboundedReceiver,
    UnboundedSender,
};
use tracing::trace;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FlipId(pub u64);

impl FlipId {
    pub fn next(self) -> Self {
        FlipId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for FlipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TimerKind {
    BeginAnimation,
    Resolve,
    DismissOverlay,
    Reset,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Timer {
    pub flip: FlipId,
    pub kind: TimerKind,
}

impl Timer {
    pub fn new(flip: FlipId, kind: TimerKind) -> Self {
        Self { flip, kind }
    }
}

/// Timers can't be cancelled: once scheduled they always fire.
pub trait Scheduler {
    fn schedule(&mut self, timer: Timer, delay: Duration);
}

impl<T: Scheduler + ?Sized> Scheduler for Box<T> {
    fn schedule(&mut self, timer: Timer, delay: Duration) {
        (**self).schedule(timer, delay)
    }
}

/// Sleeps on the tokio timer wheel and posts fired timers to a channel.
/// Must be used from inside a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    tx: UnboundedSender<Timer>,
}

impl TokioScheduler {
    pub fn new() -> (Self, UnboundedReceiver<Timer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, timer: Timer, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(?timer, "timer fired");
            // receiver gone means the app is shutting down
            let _ = tx.send(timer);
        });
    }
}

/// Deterministic scheduler on a virtual clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

#[derive(Debug)]
struct Pending {
    due: Duration,
    seq: u64,
    timer: Timer,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Earliest timer due no later than `until`, moving the clock to its due
    /// time. Timers due at the same instant come out in scheduling order.
    pub fn fire_next(&mut self, until: Duration) -> Option<Timer> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(idx, _)| idx)?;
        let pending = self.pending.remove(idx);
        self.now = self.now.max(pending.due);
        Some(pending.timer)
    }

    /// Moves the clock forward without firing anything.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Fires every timer due within `delta`. Timers scheduled by whoever
    /// handles the result are not included.
    pub fn advance(&mut self, delta: Duration) -> Vec<Timer> {
        let until = self.now + delta;
        let mut fired = Vec::new();
        while let Some(timer) = self.fire_next(until) {
            fired.push(timer);
        }
        self.settle(until);
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, timer: Timer, delay: Duration) {
        self.seq += 1;
        self.pending.push(Pending {
            due: self.now + delay,
            seq: self.seq,
            timer,
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    const FLIP: FlipId = FlipId(1);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn manual_scheduler__fires_in_due_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Timer::new(FLIP, TimerKind::Resolve), ms(2_000));
        scheduler.schedule(Timer::new(FLIP, TimerKind::BeginAnimation), ms(50));

        let fired = scheduler.advance(ms(3_000));

        let kinds: Vec<TimerKind> = fired.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TimerKind::BeginAnimation, TimerKind::Resolve]);
        assert_eq!(scheduler.now(), ms(3_000));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_scheduler__holds_timers_not_yet_due() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Timer::new(FLIP, TimerKind::Reset), ms(3_000));

        assert!(scheduler.advance(ms(2_999)).is_empty());
        assert_eq!(scheduler.advance(ms(1)).len(), 1);
    }

    #[test]
    fn manual_scheduler__same_due_time_keeps_scheduling_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Timer::new(FLIP, TimerKind::Reset), ms(10));
        scheduler.schedule(Timer::new(FLIP, TimerKind::DismissOverlay), ms(10));

        let kinds: Vec<TimerKind> = scheduler.advance(ms(10)).iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TimerKind::Reset, TimerKind::DismissOverlay]);
    }

    #[test]
    fn manual_scheduler__fire_next_moves_clock_to_due_time() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Timer::new(FLIP, TimerKind::Resolve), ms(2_000));

        scheduler.fire_next(ms(10_000)).unwrap();
        // timers scheduled now are relative to the resolve instant
        scheduler.schedule(Timer::new(FLIP, TimerKind::Reset), ms(3_000));

        assert!(scheduler.fire_next(ms(4_999)).is_none());
        assert!(scheduler.fire_next(ms(5_000)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler__delivers_after_delay() {
        let (mut scheduler, mut rx) = TokioScheduler::new();
        scheduler.schedule(Timer::new(FLIP, TimerKind::Reset), ms(3_000));
        scheduler.schedule(Timer::new(FLIP, TimerKind::BeginAnimation), ms(50));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();

        assert_eq!(first.kind, TimerKind::BeginAnimation);
        assert_eq!(second.kind, TimerKind::Reset);
    }
}
