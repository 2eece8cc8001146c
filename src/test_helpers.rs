//! Deterministic harness for driving a controller through whole flips
//! without real time or randomness.

use crate::{
    clock::FixedClock,
    coin::{
        ScriptedCoin,
        Side,
    },
    game::{
        GameController,
        Timings,
    },
    scheduler::{
        FlipId,
        ManualScheduler,
    },
    storage::MemoryStorage,
};
use std::time::Duration;

pub type TestController = GameController<ScriptedCoin, ManualScheduler, FixedClock, MemoryStorage>;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct TestContext {
    controller: TestController,
    storage: MemoryStorage,
    clock: FixedClock,
    clock_offset: i64,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// Starts a session on top of whatever `storage` already holds.
    pub fn with_storage(storage: MemoryStorage) -> Self {
        let clock = FixedClock::at(START_MILLIS);
        let controller = GameController::new(
            ScriptedCoin::default(),
            ManualScheduler::new(),
            clock.clone(),
            storage.clone(),
            Timings::default(),
        );
        Self {
            controller,
            storage,
            clock,
            clock_offset: 0,
        }
    }

    pub fn controller(&self) -> &TestController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TestController {
        &mut self.controller
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    /// Moves the wall clock away from virtual time, e.g. a clock stepping
    /// back during a session.
    pub fn shift_clock(&mut self, millis: i64) {
        self.clock_offset += millis;
        self.sync_clock();
    }

    /// The next draw lands on `side`.
    pub fn force(&mut self, side: Side) {
        self.controller.coin_mut().push(side);
    }

    pub fn draws(&self) -> usize {
        self.controller.coin().draws()
    }

    /// Runs virtual time forward, delivering every timer that comes due,
    /// including ones armed along the way. The wall clock follows.
    pub fn advance(&mut self, delta: Duration) {
        let until = self.controller.scheduler().now() + delta;
        while let Some(timer) = self.controller.scheduler_mut().fire_next(until) {
            self.sync_clock();
            self.controller.on_timer(timer);
        }
        self.controller.scheduler_mut().settle(until);
        self.sync_clock();
    }

    pub fn advance_ms(&mut self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Selects, flips against a forced side and waits for the reset.
    pub fn play(&mut self, choice: Side, forced: Side) -> FlipId {
        self.force(forced);
        self.controller
            .select_choice(choice)
            .expect("selection accepted");
        let id = self.controller.flip().expect("flip accepted");
        let timings = self.controller.timings();
        self.advance(timings.resolve + timings.reset);
        id
    }

    fn sync_clock(&mut self) {
        let elapsed = self.controller.scheduler().now().as_millis() as i64;
        self.clock.set(START_MILLIS + elapsed + self.clock_offset);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
