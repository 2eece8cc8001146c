use crate::{
    codec,
    error::{
        HistoryError,
        StorageError,
    },
    record::FlipRecord,
    storage::HistoryStorage,
};
use tracing::{
    debug,
    info,
    warn,
};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// Whole percent, rounded half up. Zero for an empty history.
    pub win_rate: u32,
}

impl Stats {
    pub fn from_records(records: &[FlipRecord]) -> Self {
        let total = records.len();
        let wins = records.iter().filter(|r| r.is_win()).count();
        let losses = total - wins;
        let win_rate = if total == 0 {
            0
        } else {
            ((200 * wins + total) / (2 * total)) as u32
        };
        Self {
            total,
            wins,
            losses,
            win_rate,
        }
    }
}

/// Answer to the "are you sure?" prompt that guards `clear`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Append-only flip log mirrored into a [`HistoryStorage`] entry.
///
/// After the first storage failure the store stops saving and keeps the
/// history in memory for the rest of the session. A confirmed clear still
/// removes the saved entry.
#[derive(Debug)]
pub struct HistoryStore<St> {
    records: Vec<FlipRecord>,
    storage: St,
    persistent: bool,
}

impl<St: HistoryStorage> HistoryStore<St> {
    /// Loads whatever was saved before. The store is always usable; the second
    /// value reports why the saved history could not be used, if it couldn't.
    pub fn load(storage: St) -> (Self, Option<HistoryError>) {
        let mut store = Self {
            records: Vec::new(),
            storage,
            persistent: true,
        };
        let warning = match store.storage.read() {
            Ok(None) => {
                debug!("no saved history, starting empty");
                None
            }
            Ok(Some(data)) => match codec::decode(&data) {
                Ok(records) => {
                    info!(flips = records.len(), "loaded saved history");
                    store.records = records;
                    None
                }
                Err(e) => {
                    warn!(error = %e, "saved history is malformed, starting empty");
                    Some(e)
                }
            },
            Err(e) => {
                warn!(error = %e, "could not read saved history, keeping history in memory");
                store.persistent = false;
                Some(HistoryError::Persistence(e))
            }
        };
        (store, warning)
    }

    /// Adds `record` to the end of the history. The record is kept even when
    /// `Err` is returned; the error only says it was not saved.
    pub fn append(&mut self, record: FlipRecord) -> Result<(), HistoryError> {
        self.records.push(record);
        self.persist()
    }

    /// Empties the history and erases the saved entry. Does nothing unless
    /// the user confirmed.
    ///
    /// The entry is removed even when the store no longer writes, so an older
    /// saved history cannot come back on the next start.
    pub fn clear(&mut self, confirmation: Confirmation) -> Result<(), HistoryError> {
        if confirmation == Confirmation::Declined {
            debug!("clear declined");
            return Ok(());
        }
        let cleared = self.records.len();
        self.records.clear();
        info!(cleared, persistent = self.persistent, "history cleared");
        if let Err(e) = self.storage.remove() {
            return Err(self.degrade(e));
        }
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        Stats::from_records(&self.records)
    }

    /// Last `n` records, newest first.
    pub fn recent(&self, n: usize) -> Vec<&FlipRecord> {
        self.records.iter().rev().take(n).collect()
    }

    pub fn records(&self) -> &[FlipRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.records.last().map(FlipRecord::timestamp)
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn storage(&self) -> &St {
        &self.storage
    }

    fn persist(&mut self) -> Result<(), HistoryError> {
        if !self.persistent {
            return Ok(());
        }
        let json = codec::encode(&self.records)?;
        if let Err(e) = self.storage.write(&json) {
            return Err(self.degrade(e));
        }
        Ok(())
    }

    fn degrade(&mut self, e: StorageError) -> HistoryError {
        warn!(error = %e, "history storage failed, keeping history in memory only");
        self.persistent = false;
        HistoryError::Persistence(e)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        coin::Side,
        storage::MemoryStorage,
    };
    use proptest::prelude::*;

    fn record(choice: Side, result: Side, at: i64) -> FlipRecord {
        FlipRecord::new(choice, result, at)
    }

    #[test]
    fn stats__empty_history_is_all_zero() {
        assert_eq!(Stats::from_records(&[]), Stats::default());
    }

    #[test]
    fn stats__win_rate_rounds_half_up() {
        // 1 of 8 is 12.5%
        let mut records = vec![record(Side::Heads, Side::Heads, 0)];
        records.extend((1..8).map(|i| record(Side::Heads, Side::Tails, i)));
        assert_eq!(Stats::from_records(&records).win_rate, 13);

        // 2 of 3 is 66.7%
        let records = vec![
            record(Side::Heads, Side::Heads, 0),
            record(Side::Tails, Side::Tails, 1),
            record(Side::Tails, Side::Heads, 2),
        ];
        assert_eq!(Stats::from_records(&records).win_rate, 67);
    }

    proptest! {
        #[test]
        fn stats__counts_add_up(outcomes in prop::collection::vec(any::<bool>(), 0..200)) {
            let records: Vec<FlipRecord> = outcomes
                .iter()
                .enumerate()
                .map(|(i, won)| {
                    let result = if *won { Side::Heads } else { Side::Tails };
                    record(Side::Heads, result, i as i64)
                })
                .collect();
            let stats = Stats::from_records(&records);
            prop_assert_eq!(stats.wins + stats.losses, stats.total);
            if stats.total > 0 {
                let expected = (100.0 * stats.wins as f64 / stats.total as f64).round() as u32;
                prop_assert_eq!(stats.win_rate, expected);
            } else {
                prop_assert_eq!(stats.win_rate, 0);
            }
        }
    }

    #[test]
    fn recent__newest_first_and_capped() {
        let (mut store, _) = HistoryStore::load(MemoryStorage::new());
        for i in 0..5 {
            store.append(record(Side::Heads, Side::Tails, i)).unwrap();
        }
        let recent: Vec<i64> = store.recent(3).iter().map(|r| r.timestamp()).collect();
        assert_eq!(recent, vec![4, 3, 2]);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn append__storage_failure_keeps_record_and_goes_memory_only() {
        let storage = MemoryStorage::new();
        let (mut store, _) = HistoryStore::load(storage.clone());
        storage.fail_writes(true);

        let err = store.append(record(Side::Heads, Side::Heads, 1)).unwrap_err();

        assert!(matches!(err, HistoryError::Persistence(_)));
        assert_eq!(store.len(), 1);
        assert!(!store.is_persistent());

        // no further attempts once degraded
        storage.fail_writes(false);
        store.append(record(Side::Heads, Side::Heads, 2)).unwrap();
        assert_eq!(storage.value(), None);
    }
}
