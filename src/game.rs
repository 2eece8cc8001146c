//! Flip lifecycle: `Idle -> Ready -> Flipping -> Resolved -> Idle`.
//!
//! The coin is drawn the moment `flip` is accepted. Everything after that is
//! presentation driven by timers: the animation starts, the result is
//! recorded, the overlay goes away and the game resets. Only the reset timer
//! lets a new flip in.

use crate::{
    clock::Clock,
    coin::{
        CoinSource,
        Outcome,
        Side,
    },
    error::HistoryError,
    history::{
        Confirmation,
        HistoryStore,
        Stats,
    },
    record::FlipRecord,
    scheduler::{
        FlipId,
        Scheduler,
        Timer,
        TimerKind,
    },
    storage::HistoryStorage,
};
use std::{
    fmt,
    time::Duration,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
    trace,
    warn,
};

const MAX_NOTICES: usize = 50;
const SHOWN_NOTICES: usize = 5;

/// Delays of the lifecycle. `animation_start` and `resolve` count from the
/// flip; `overlay` and `reset` count from resolution.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Timings {
    pub animation_start: Duration,
    pub resolve: Duration,
    pub overlay: Duration,
    pub reset: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            animation_start: Duration::from_millis(50),
            resolve: Duration::from_millis(2_000),
            overlay: Duration::from_millis(2_500),
            reset: Duration::from_millis(3_000),
        }
    }
}

impl Timings {
    pub fn divided_by(self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            animation_start: self.animation_start / factor,
            resolve: self.resolve / factor,
            overlay: self.overlay / factor,
            reset: self.reset / factor,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Ready,
    Flipping,
    Resolved,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoinFace {
    Resting(Side),
    Spinning,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Overlay {
    Victory,
    Defeat,
}

/// Result line shown between resolution and reset.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Announcement {
    pub outcome: Outcome,
    pub coin_result: Side,
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Win => write!(f, "You won! The coin landed on {}!", self.coin_result),
            Outcome::Loss => write!(f, "You lost! The coin landed on {}.", self.coin_result),
        }
    }
}

/// Input the controller turned away. Routine under fast or repeated input,
/// so it is never reported to the player as an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Rejected {
    #[error("choose heads or tails first")]
    NoChoice,
    #[error("a flip is already in progress")]
    FlipInProgress,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GameState {
    pub player_choice: Option<Side>,
    pub is_flipping: bool,
}

#[derive(Copy, Clone, Debug)]
struct InFlight {
    id: FlipId,
    choice: Side,
    coin_result: Side,
    player_won: bool,
    resolved: bool,
}

pub struct GameController<C, S, K, St> {
    state: GameState,
    in_flight: Option<InFlight>,
    last_flip: FlipId,
    history: HistoryStore<St>,
    coin: C,
    scheduler: S,
    clock: K,
    timings: Timings,
    face: CoinFace,
    overlay: Option<(FlipId, Overlay)>,
    announcement: Option<Announcement>,
    notices: Vec<String>,
}

impl<C, S, K, St> GameController<C, S, K, St>
where
    C: CoinSource,
    S: Scheduler,
    K: Clock,
    St: HistoryStorage,
{
    pub fn new(coin: C, scheduler: S, clock: K, storage: St, timings: Timings) -> Self {
        let (history, warning) = HistoryStore::load(storage);
        let mut controller = Self {
            state: GameState::default(),
            in_flight: None,
            last_flip: FlipId::default(),
            history,
            coin,
            scheduler,
            clock,
            timings,
            face: CoinFace::Resting(Side::Heads),
            overlay: None,
            announcement: None,
            notices: Vec::new(),
        };
        if let Some(e) = warning {
            controller.push_notice(e.to_string());
        }
        controller
    }

    pub fn select_choice(&mut self, choice: Side) -> Result<(), Rejected> {
        if self.state.is_flipping {
            debug!(%choice, "selection ignored, flip in progress");
            return Err(Rejected::FlipInProgress);
        }
        self.state.player_choice = Some(choice);
        debug!(%choice, "choice selected");
        Ok(())
    }

    /// Draws the coin and starts the animation. The outcome is fixed here.
    pub fn flip(&mut self) -> Result<FlipId, Rejected> {
        if self.state.is_flipping {
            debug!("flip ignored, flip in progress");
            return Err(Rejected::FlipInProgress);
        }
        let Some(choice) = self.state.player_choice else {
            debug!("flip ignored, no choice made");
            return Err(Rejected::NoChoice);
        };

        let id = self.last_flip.next();
        self.last_flip = id;
        self.state.is_flipping = true;
        let coin_result = self.coin.draw();
        let player_won = choice == coin_result;
        self.in_flight = Some(InFlight {
            id,
            choice,
            coin_result,
            player_won,
            resolved: false,
        });
        info!(flip = %id, %choice, %coin_result, player_won, "coin flipped");

        self.scheduler.schedule(
            Timer::new(id, TimerKind::BeginAnimation),
            self.timings.animation_start,
        );
        self.scheduler
            .schedule(Timer::new(id, TimerKind::Resolve), self.timings.resolve);
        Ok(id)
    }

    /// Feeds a fired timer back in. Timers armed by an earlier flip are ignored.
    pub fn on_timer(&mut self, timer: Timer) {
        match timer.kind {
            TimerKind::BeginAnimation => {
                if let Some(flight) = self.current(timer.flip) {
                    if !flight.resolved {
                        self.face = CoinFace::Spinning;
                        return;
                    }
                }
            }
            TimerKind::Resolve => {
                if let Some(flight) = self.current(timer.flip) {
                    if !flight.resolved {
                        self.resolve(flight);
                        return;
                    }
                }
            }
            TimerKind::DismissOverlay => {
                if matches!(self.overlay, Some((id, _)) if id == timer.flip) {
                    self.overlay = None;
                    return;
                }
            }
            TimerKind::Reset => {
                if self.current(timer.flip).is_some() {
                    self.reset();
                    return;
                }
            }
        }
        trace!(?timer, "stale timer ignored");
    }

    /// Hides the win/loss overlay before its timer does.
    pub fn dismiss_overlay(&mut self) {
        self.overlay = None;
    }

    /// Accepted at any point, an in-flight flip still lands in the emptied
    /// history.
    pub fn clear_history(&mut self, confirmation: Confirmation) -> Result<(), HistoryError> {
        let result = self.history.clear(confirmation);
        if let Err(e) = &result {
            self.push_notice(e.to_string());
        }
        result
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        match (self.in_flight, self.state.player_choice) {
            (Some(flight), _) if flight.resolved => Phase::Resolved,
            (Some(_), _) => Phase::Flipping,
            (None, Some(_)) => Phase::Ready,
            (None, None) => Phase::Idle,
        }
    }

    pub fn stats(&self) -> Stats {
        self.history.stats()
    }

    pub fn history(&self) -> &HistoryStore<St> {
        &self.history
    }

    pub fn face(&self) -> CoinFace {
        self.face
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay.map(|(_, overlay)| overlay)
    }

    pub fn announcement(&self) -> Option<Announcement> {
        self.announcement
    }

    /// Most recent warnings first.
    pub fn notices(&self) -> Vec<&str> {
        self.notices
            .iter()
            .rev()
            .take(SHOWN_NOTICES)
            .map(String::as_str)
            .collect()
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn coin(&self) -> &C {
        &self.coin
    }

    pub fn coin_mut(&mut self) -> &mut C {
        &mut self.coin
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn current(&self, id: FlipId) -> Option<InFlight> {
        self.in_flight.filter(|flight| flight.id == id)
    }

    fn resolve(&mut self, flight: InFlight) {
        let now = self.clock.now_millis();
        let timestamp = self.history.last_timestamp().map_or(now, |last| now.max(last));
        let record = FlipRecord::new(flight.choice, flight.coin_result, timestamp);
        let outcome = record.outcome();
        debug_assert_eq!(outcome.is_win(), flight.player_won);

        if let Err(e) = self.history.append(record) {
            warn!(flip = %flight.id, error = %e, "flip recorded in memory only");
            self.push_notice(e.to_string());
        }
        let stats = self.history.stats();
        info!(
            flip = %flight.id,
            ?outcome,
            total = stats.total,
            win_rate = stats.win_rate,
            "flip resolved"
        );

        self.in_flight = Some(InFlight {
            resolved: true,
            ..flight
        });
        self.face = CoinFace::Resting(flight.coin_result);
        self.announcement = Some(Announcement {
            outcome,
            coin_result: flight.coin_result,
        });
        let overlay = if flight.player_won {
            Overlay::Victory
        } else {
            Overlay::Defeat
        };
        self.overlay = Some((flight.id, overlay));

        self.scheduler.schedule(
            Timer::new(flight.id, TimerKind::DismissOverlay),
            self.timings.overlay,
        );
        self.scheduler
            .schedule(Timer::new(flight.id, TimerKind::Reset), self.timings.reset);
    }

    fn reset(&mut self) {
        self.state = GameState::default();
        self.in_flight = None;
        self.announcement = None;
        self.face = CoinFace::Resting(Side::Heads);
        debug!("game reset");
    }

    fn push_notice(&mut self, notice: String) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let drain = self.notices.len() - MAX_NOTICES;
            self.notices.drain(0..drain);
        }
    }
}
