//! JSON form of the history: a single array of records, the same value the
//! browser version kept under its `localStorage` key.

use crate::{
    error::HistoryError,
    record::FlipRecord,
};

pub fn encode(records: &[FlipRecord]) -> Result<String, HistoryError> {
    serde_json::to_string(records).map_err(HistoryError::Encode)
}

/// All or nothing: any bad record discards the whole value.
///
/// Timestamps are taken as saved. Only appends within one session are
/// clamped, so a history spanning a wall clock step back is still valid.
pub fn decode(data: &str) -> Result<Vec<FlipRecord>, HistoryError> {
    serde_json::from_str::<Vec<FlipRecord>>(data)
        .map_err(|e| HistoryError::MalformedData(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::coin::Side;
    use proptest::prelude::*;

    fn side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Heads), Just(Side::Tails)]
    }

    prop_compose! {
        fn history()(flips in prop::collection::vec((side(), side(), 0i64..10_000), 0..40)) -> Vec<FlipRecord> {
            let mut at = 1_700_000_000_000i64;
            flips
                .into_iter()
                .map(|(choice, result, gap)| {
                    at += gap;
                    FlipRecord::new(choice, result, at)
                })
                .collect()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
        #[test]
        fn decode__inverts_encode(records in history()) {
            let json = encode(&records).unwrap();
            prop_assert_eq!(decode(&json).unwrap(), records);
        }
    }

    #[test]
    fn decode__reads_value_written_by_browser() {
        let json = r#"[
            {"playerChoice":"heads","coinResult":"tails","result":"loss","timestamp":1700000000000},
            {"playerChoice":"tails","coinResult":"tails","result":"win","timestamp":1700000004000}
        ]"#;
        let records = decode(json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_win());
        assert!(records[1].is_win());
    }

    #[test]
    fn decode__empty_array_is_empty_history() {
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn decode__corrupt_data_is_malformed() {
        for bad in ["", "{", "null", "{\"a\":1}", "[1,2,3]", "[{\"playerChoice\":\"heads\"}]"] {
            let err = decode(bad).unwrap_err();
            assert!(matches!(err, HistoryError::MalformedData(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn decode__one_bad_record_rejects_everything() {
        let json = r#"[
            {"playerChoice":"heads","coinResult":"heads","result":"win","timestamp":1},
            {"playerChoice":"heads","coinResult":"heads","result":"loss","timestamp":2}
        ]"#;
        assert!(decode(json).is_err());
    }

    #[test]
    fn decode__keeps_timestamps_that_step_back_between_sessions() {
        let records = vec![
            FlipRecord::new(Side::Heads, Side::Heads, 1_700_000_005_000),
            FlipRecord::new(Side::Tails, Side::Heads, 1_700_000_001_000),
        ];

        let json = encode(&records).unwrap();

        assert_eq!(decode(&json).unwrap(), records);
    }
}
