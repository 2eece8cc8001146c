pub mod clock;
pub mod codec;
pub mod coin;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod logging;
pub mod record;
pub mod scheduler;
pub mod storage;

pub mod test_helpers;

pub use coin::{
    Outcome,
    Side,
};
pub use error::{
    HistoryError,
    StorageError,
};
pub use game::{
    GameController,
    GameState,
    Phase,
    Rejected,
    Timings,
};
pub use history::{
    Confirmation,
    HistoryStore,
    Stats,
};
pub use record::FlipRecord;
