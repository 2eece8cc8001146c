#![allow(non_snake_case)]
use coin_flip::{
    Confirmation,
    FlipRecord,
    HistoryError,
    HistoryStore,
    Side,
    codec,
    storage::{
        FileStorage,
        HistoryStorage,
        MemoryStorage,
    },
};

fn flips() -> Vec<FlipRecord> {
    vec![
        FlipRecord::new(Side::Heads, Side::Tails, 1_000),
        FlipRecord::new(Side::Tails, Side::Tails, 2_000),
        FlipRecord::new(Side::Heads, Side::Heads, 3_000),
    ]
}

#[test]
fn load__missing_entry_starts_empty_without_warning() {
    // when
    let (store, warning) = HistoryStore::load(MemoryStorage::new());

    // then
    assert!(store.is_empty());
    assert!(warning.is_none());
    assert!(store.is_persistent());
}

#[test]
fn load__reads_saved_history() {
    // given
    let saved = codec::encode(&flips()).unwrap();

    // when
    let (store, warning) = HistoryStore::load(MemoryStorage::with_value(saved));

    // then
    assert!(warning.is_none());
    assert_eq!(store.records(), flips().as_slice());
    assert_eq!(store.last_timestamp(), Some(3_000));
}

#[test]
fn load__malformed_entry_is_discarded_not_half_applied() {
    // given: two good records then a broken one
    let saved = r#"[
        {"playerChoice":"heads","coinResult":"tails","result":"loss","timestamp":1},
        {"playerChoice":"tails","coinResult":"tails","result":"win","timestamp":2},
        {"playerChoice":"tails","coinResult":"tails","result":"maybe","timestamp":3}
    ]"#;

    // when
    let (store, warning) = HistoryStore::load(MemoryStorage::with_value(saved));

    // then
    assert!(store.is_empty());
    assert!(matches!(warning, Some(HistoryError::MalformedData(_))));
    assert!(store.is_persistent());
}

#[test]
fn load__malformed_entry_is_replaced_by_next_append() {
    // given
    let storage = MemoryStorage::with_value("not json at all");
    let (mut store, _) = HistoryStore::load(storage.clone());

    // when
    store
        .append(FlipRecord::new(Side::Heads, Side::Heads, 10))
        .unwrap();

    // then
    let saved = codec::decode(&storage.value().unwrap()).unwrap();
    assert_eq!(saved.len(), 1);
}

#[test]
fn load__read_failure_falls_back_to_memory_only() {
    // given
    let storage = MemoryStorage::with_value(codec::encode(&flips()).unwrap());
    storage.fail_reads(true);

    // when
    let (mut store, warning) = HistoryStore::load(storage.clone());
    store
        .append(FlipRecord::new(Side::Heads, Side::Heads, 10))
        .unwrap();

    // then saved value is left alone
    assert!(matches!(warning, Some(HistoryError::Persistence(_))));
    assert!(!store.is_persistent());
    assert_eq!(store.len(), 1);
    storage.fail_reads(false);
    assert_eq!(codec::decode(&storage.value().unwrap()).unwrap(), flips());
}

#[test]
fn append__persists_whole_history_each_time() {
    // given
    let storage = MemoryStorage::new();
    let (mut store, _) = HistoryStore::load(storage.clone());

    // when
    for record in flips() {
        store.append(record).unwrap();
    }

    // then
    assert_eq!(codec::decode(&storage.value().unwrap()).unwrap(), flips());
}

#[test]
fn append__existing_entries_are_never_changed() {
    // given
    let (mut store, _) = HistoryStore::load(MemoryStorage::new());
    store.append(flips()[0].clone()).unwrap();
    let before = store.records()[0].clone();

    // when
    for record in flips().into_iter().skip(1) {
        store.append(record).unwrap();
    }

    // then
    assert_eq!(store.records()[0], before);
    assert_eq!(store.len(), 3);
}

#[test]
fn clear__declined_leaves_everything() {
    // given
    let storage = MemoryStorage::new();
    let (mut store, _) = HistoryStore::load(storage.clone());
    for record in flips() {
        store.append(record).unwrap();
    }

    // when
    store.clear(Confirmation::Declined).unwrap();

    // then
    assert_eq!(store.len(), 3);
    assert!(storage.value().is_some());
}

#[test]
fn clear__confirmed_empties_memory_and_storage() {
    // given
    let storage = MemoryStorage::new();
    let (mut store, _) = HistoryStore::load(storage.clone());
    for record in flips() {
        store.append(record).unwrap();
    }

    // when
    store.clear(Confirmation::Confirmed).unwrap();

    // then
    assert!(store.is_empty());
    assert_eq!(store.stats().total, 0);
    assert_eq!(storage.value(), None);
}

#[test]
fn clear__storage_failure_still_empties_memory() {
    // given
    let storage = MemoryStorage::new();
    let (mut store, _) = HistoryStore::load(storage.clone());
    store.append(flips()[0].clone()).unwrap();
    storage.fail_writes(true);

    // when
    let actual = store.clear(Confirmation::Confirmed);

    // then
    assert!(matches!(actual, Err(HistoryError::Persistence(_))));
    assert!(store.is_empty());
    assert!(!store.is_persistent());
}

#[test]
fn clear__confirmed_after_write_failure_still_erases_saved_entry() {
    // given
    let storage = MemoryStorage::new();
    let (mut store, _) = HistoryStore::load(storage.clone());
    store.append(flips()[0].clone()).unwrap();
    storage.fail_writes(true);
    assert!(store.append(flips()[1].clone()).is_err());
    storage.fail_writes(false);

    // when
    store.clear(Confirmation::Confirmed).unwrap();

    // then
    assert_eq!(storage.value(), None);
    let (reloaded, warning) = HistoryStore::load(storage);
    assert!(warning.is_none());
    assert!(reloaded.is_empty());
}

#[test]
fn load__keeps_history_whose_clock_stepped_back_between_sessions() {
    // given
    let saved = vec![
        FlipRecord::new(Side::Heads, Side::Heads, 1_700_000_005_000),
        FlipRecord::new(Side::Heads, Side::Tails, 1_700_000_001_000),
    ];
    let storage = MemoryStorage::with_value(codec::encode(&saved).unwrap());

    // when
    let (mut store, warning) = HistoryStore::load(storage.clone());
    store
        .append(FlipRecord::new(Side::Tails, Side::Tails, 1_700_000_002_000))
        .unwrap();

    // then
    assert!(warning.is_none());
    assert_eq!(&store.records()[..2], saved.as_slice());
    assert_eq!(codec::decode(&storage.value().unwrap()).unwrap().len(), 3);
}

#[test]
fn recent__does_not_mutate_history() {
    // given
    let (mut store, _) = HistoryStore::load(MemoryStorage::new());
    for record in flips() {
        store.append(record).unwrap();
    }

    // when
    let recent: Vec<i64> = store.recent(10).iter().map(|r| r.timestamp()).collect();

    // then
    assert_eq!(recent, vec![3_000, 2_000, 1_000]);
    assert_eq!(store.records(), flips().as_slice());
    assert!(store.recent(0).is_empty());
}

#[test]
fn file_storage__history_survives_reopen() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let (mut store, _) = HistoryStore::load(FileStorage::in_dir(dir.path()));
    for record in flips() {
        store.append(record).unwrap();
    }

    // when
    let (reopened, warning) = HistoryStore::load(FileStorage::in_dir(dir.path()));

    // then
    assert!(warning.is_none());
    assert_eq!(reopened.records(), flips().as_slice());
    let stats = reopened.stats();
    assert_eq!((stats.total, stats.wins, stats.losses, stats.win_rate), (3, 2, 1, 67));
}

#[test]
fn file_storage__clear_removes_file() {
    // given
    let dir = tempfile::tempdir().unwrap();
    let (mut store, _) = HistoryStore::load(FileStorage::in_dir(dir.path()));
    store.append(flips()[0].clone()).unwrap();
    assert!(store.storage().path().exists());

    // when
    store.clear(Confirmation::Confirmed).unwrap();

    // then
    assert!(!store.storage().path().exists());
    assert_eq!(store.storage().read().unwrap(), None);
}
