use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::VecDeque,
    fmt,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Heads,
    Tails,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Heads => "heads",
            Side::Tails => "tails",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn of(choice: Side, result: Side) -> Self {
        if choice == result {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

/// Source of coin draws. Every draw must be an independent fair toss.
pub trait CoinSource {
    fn draw(&mut self) -> Side;
}

fn side_from_bit(heads: bool) -> Side {
    if heads { Side::Heads } else { Side::Tails }
}

#[derive(Clone, Debug, Default)]
pub struct SystemCoin;

impl CoinSource for SystemCoin {
    fn draw(&mut self) -> Side {
        side_from_bit(rand::rng().random_bool(0.5))
    }
}

/// Reproducible coin for replays (`--seed`).
#[derive(Clone, Debug)]
pub struct SeededCoin {
    inner: StdRng,
}

impl SeededCoin {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl CoinSource for SeededCoin {
    fn draw(&mut self) -> Side {
        side_from_bit(self.inner.random_bool(0.5))
    }
}

/// Hands out forced sides in order, then falls back to heads.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCoin {
    queue: VecDeque<Side>,
    draws: usize,
}

impl ScriptedCoin {
    pub fn new(sides: impl IntoIterator<Item = Side>) -> Self {
        Self {
            queue: sides.into_iter().collect(),
            draws: 0,
        }
    }

    pub fn push(&mut self, side: Side) {
        self.queue.push_back(side);
    }

    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl CoinSource for ScriptedCoin {
    fn draw(&mut self) -> Side {
        self.draws += 1;
        self.queue.pop_front().unwrap_or(Side::Heads)
    }
}

impl<T: CoinSource + ?Sized> CoinSource for Box<T> {
    fn draw(&mut self) -> Side {
        (**self).draw()
    }
}
