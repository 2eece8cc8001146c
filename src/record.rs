use crate::coin::{
    Outcome,
    Side,
};
use serde::{
    Deserialize,
    Serialize,
};

/// One completed flip. The outcome is derived from the two sides when the
/// record is built and can't be changed afterwards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", rename_all = "camelCase")]
pub struct FlipRecord {
    player_choice: Side,
    coin_result: Side,
    #[serde(rename = "result")]
    outcome: Outcome,
    timestamp: i64,
}

impl FlipRecord {
    pub fn new(player_choice: Side, coin_result: Side, timestamp: i64) -> Self {
        Self {
            player_choice,
            coin_result,
            outcome: Outcome::of(player_choice, coin_result),
            timestamp,
        }
    }

    pub fn player_choice(&self) -> Side {
        self.player_choice
    }

    pub fn coin_result(&self) -> Side {
        self.coin_result
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_win(&self) -> bool {
        self.outcome.is_win()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    player_choice: Side,
    coin_result: Side,
    result: Outcome,
    timestamp: i64,
}

impl TryFrom<RawRecord> for FlipRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let record = FlipRecord::new(raw.player_choice, raw.coin_result, raw.timestamp);
        if record.outcome != raw.result {
            return Err(format!(
                "record at {} says {:?} but {} vs {} is a {:?}",
                raw.timestamp,
                raw.result,
                raw.player_choice,
                raw.coin_result,
                record.outcome
            ));
        }
        Ok(record)
    }
}
