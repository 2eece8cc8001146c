use crate::ui;
use chrono::{
    Local,
    TimeZone,
};
use coin_flip::{
    Confirmation,
    GameController,
    Outcome,
    Phase,
    Side,
    Stats,
    clock::SystemClock,
    coin::{
        CoinSource,
        SeededCoin,
        SystemCoin,
    },
    config::{
        AppConfig,
        StorageTarget,
    },
    game::{
        CoinFace,
        Overlay,
    },
    scheduler::{
        Timer,
        TokioScheduler,
    },
    storage::{
        FileStorage,
        HistoryStorage,
        MemoryStorage,
    },
};
use color_eyre::eyre::Result;
use crossterm::event::EventStream;
use std::time::Duration;
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time,
};
use tracing::{
    debug,
    error,
    info,
};

pub const HISTORY_DISPLAY_LIMIT: usize = 10;
const FRAME_INTERVAL: Duration = Duration::from_millis(120);

type Controller =
    GameController<Box<dyn CoinSource>, TokioScheduler, SystemClock, Box<dyn HistoryStorage>>;

#[derive(Clone, Debug)]
pub struct HistoryRow {
    pub coin_result: Side,
    pub outcome: Outcome,
    pub time: String,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub phase: Phase,
    pub choice: Option<Side>,
    pub face: CoinFace,
    pub overlay: Option<Overlay>,
    pub announcement: Option<(Outcome, String)>,
    pub stats: Stats,
    pub recent: Vec<HistoryRow>,
    pub notices: Vec<String>,
    pub storage_label: String,
    pub status: String,
    pub frame: u64,
}

pub struct AppController {
    game: Controller,
    storage_label: String,
    status: String,
    frame: u64,
}

impl AppController {
    pub fn new(config: &AppConfig, scheduler: TokioScheduler) -> Self {
        let (storage, storage_label): (Box<dyn HistoryStorage>, String) = match &config.storage {
            StorageTarget::File(path) => (
                Box::new(FileStorage::new(path.clone())),
                path.display().to_string(),
            ),
            StorageTarget::Memory => (
                Box::new(MemoryStorage::new()),
                String::from("memory only"),
            ),
        };
        let coin: Box<dyn CoinSource> = match config.seed {
            Some(seed) => Box::new(SeededCoin::from_seed(seed)),
            None => Box::new(SystemCoin),
        };
        let game = GameController::new(coin, scheduler, SystemClock, storage, config.timings);
        info!(
            storage = %storage_label,
            flips = game.history().len(),
            "game ready"
        );
        Self {
            game,
            storage_label,
            status: String::from("Choose First"),
            frame: 0,
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let history = self.game.history();
        let recent = history
            .recent(HISTORY_DISPLAY_LIMIT)
            .into_iter()
            .map(|record| HistoryRow {
                coin_result: record.coin_result(),
                outcome: record.outcome(),
                time: format_time(record.timestamp()),
            })
            .collect();
        let storage_label = if history.is_persistent() {
            self.storage_label.clone()
        } else {
            format!("{} (not saving)", self.storage_label)
        };
        AppSnapshot {
            phase: self.game.phase(),
            choice: self.game.state().player_choice,
            face: self.game.face(),
            overlay: self.game.overlay(),
            announcement: self
                .game
                .announcement()
                .map(|a| (a.outcome, a.to_string())),
            stats: self.game.stats(),
            recent,
            notices: self.game.notices().into_iter().map(String::from).collect(),
            storage_label,
            status: self.status.clone(),
            frame: self.frame,
        }
    }

    pub fn select(&mut self, side: Side) {
        if self.game.select_choice(side).is_ok() {
            self.status = format!("Flip for {}!", capitalize(side.name()));
        }
    }

    pub fn flip(&mut self) {
        match self.game.flip() {
            Ok(_) => self.status = String::from("Flipping..."),
            Err(rejected) => debug!(%rejected, "flip key ignored"),
        }
    }

    pub fn clear_history(&mut self, confirmation: Confirmation) {
        if self.game.clear_history(confirmation).is_ok()
            && confirmation == Confirmation::Confirmed
        {
            self.status = String::from("History cleared");
        }
    }

    pub fn dismiss_overlay(&mut self) {
        self.game.dismiss_overlay();
    }

    pub fn on_timer(&mut self, timer: Timer) {
        self.game.on_timer(timer);
        if self.game.phase() == Phase::Idle {
            self.status = String::from("Choose First");
        }
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn is_animating(&self) -> bool {
        self.game.face() == CoinFace::Spinning
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| String::from("--:--:--"))
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let (scheduler, timers) = TokioScheduler::new();
    let mut controller = AppController::new(&config, scheduler);
    let mut ui_state = ui::UiState::default();

    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state, timers).await;
    if let Err(e) = &res {
        error!(error = %e, "ui loop failed");
    }
    ui::terminal_exit()?;
    info!("bye");
    res
}

async fn run_loop(
    controller: &mut AppController,
    ui_state: &mut ui::UiState,
    mut timers: UnboundedReceiver<Timer>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = time::interval(FRAME_INTERVAL);
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            Some(timer) = timers.recv() => {
                controller.on_timer(timer);
            }
            _ = ticker.tick() => {
                if !controller.is_animating() { continue; }
                controller.tick();
            }
            ev = ui::next_event(ui_state, &mut events) => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Select(side) => controller.select(side),
                    ui::UserEvent::Flip => controller.flip(),
                    ui::UserEvent::DismissOverlay => controller.dismiss_overlay(),
                    ui::UserEvent::ConfirmClear => controller.clear_history(Confirmation::Confirmed),
                    ui::UserEvent::DeclineClear => controller.clear_history(Confirmation::Declined),
                    ui::UserEvent::Redraw => {}
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}
