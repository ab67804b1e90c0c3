use chrono::{NaiveDate, TimeZone, Utc};
use designlog::image::ImageData;
use designlog::storage::{LocalStorage, StoreError, TASKS_KEY};
use designlog::weeks::aggregate_weeks;
use designlog::{EntryKind, TaskEntry, TaskStore};
use tempfile::TempDir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entry(id: &str, name: &str, date: NaiveDate, iterated: bool) -> TaskEntry {
    TaskEntry {
        id: id.to_string(),
        name: name.to_string(),
        rough_image: ImageData::from_data_url("data:image/png;base64,cm91Z2g="),
        final_image: iterated.then(|| ImageData::from_data_url("data:image/png;base64,ZmluYWw=")),
        notes: String::new(),
        ai_description: String::new(),
        date,
        created_at: Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap(),
    }
}

fn open_store(dir: &TempDir) -> TaskStore {
    TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap()
}

#[test]
fn test_empty_store_when_nothing_saved() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert!(store.is_empty());
    assert!(store.for_day(day(2024, 3, 4)).is_empty());
}

#[test]
fn test_append_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let mut first = entry("a1", "Homepage Hero", day(2024, 3, 4), false);
    first.notes = "Bolder headline".to_string();
    let second = entry("b2", "Checkout", day(2024, 3, 6), true);
    store.append(first.clone()).unwrap();
    store.append(second.clone()).unwrap();

    let reopened = open_store(&dir);
    assert_eq!(reopened.all(), &[first, second]);
}

#[test]
fn test_for_day_keeps_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.append(entry("1", "First", day(2024, 3, 4), false)).unwrap();
    store.append(entry("2", "Other day", day(2024, 3, 5), false)).unwrap();
    store.append(entry("3", "Second", day(2024, 3, 4), true)).unwrap();

    let names: Vec<&str> = store.for_day(day(2024, 3, 4)).iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert_eq!(store.count_for_day(day(2024, 3, 5)), 1);
    assert_eq!(store.count_for_day(day(2024, 3, 7)), 0);
}

#[test]
fn test_for_week_does_not_bleed_into_neighbours() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.append(entry("1", "Prev Sunday", day(2024, 3, 3), false)).unwrap();
    store.append(entry("2", "Monday", day(2024, 3, 4), false)).unwrap();
    store.append(entry("3", "Sunday", day(2024, 3, 10), false)).unwrap();
    store.append(entry("4", "Next Monday", day(2024, 3, 11), false)).unwrap();

    let names: Vec<&str> = store.for_week(day(2024, 3, 4)).iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Monday", "Sunday"]);
}

#[test]
fn test_of_kind_matches_final_image_presence() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.append(entry("1", "Draft", day(2024, 3, 4), false)).unwrap();
    store.append(entry("2", "Polished", day(2024, 3, 4), true)).unwrap();

    for e in store.of_kind(EntryKind::Iteration) {
        assert!(e.final_image.is_some());
    }
    for e in store.of_kind(EntryKind::NewDesign) {
        assert!(e.final_image.is_none());
    }
    assert_eq!(store.of_kind(EntryKind::Iteration).len(), 1);
}

#[test]
fn test_legacy_array_file_is_migrated() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::open(dir.path()).unwrap();
    let legacy = r#"[{
        "id": "1712345678901",
        "name": "Old entry",
        "roughImage": "data:image/png;base64,cm91Z2g=",
        "finalImage": null,
        "notes": "",
        "aiDescription": "",
        "date": "2024-03-05",
        "createdAt": "2024-03-05T10:00:00.000Z"
    }]"#;
    storage.set_item(TASKS_KEY, legacy).unwrap();

    let store = TaskStore::open(storage).unwrap();
    assert_eq!(store.len(), 1);
    let e = &store.all()[0];
    assert_eq!(e.date, day(2024, 3, 5));
    assert_eq!(e.kind(), EntryKind::NewDesign);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::open(dir.path()).unwrap();
    storage.set_item(TASKS_KEY, "{ not json").unwrap();

    match TaskStore::open(storage) {
        Err(StoreError::Corrupt { .. }) => {}
        other => panic!("expected Corrupt, got {:?}", other),
    }
}

#[test]
fn test_week_bucket_for_mon_wed_fri() {
    let mut tasks = vec![
        entry("1", "Mon", day(2024, 3, 4), false),
        entry("2", "Wed", day(2024, 3, 6), true),
        entry("3", "Fri", day(2024, 3, 8), false),
    ];
    tasks[1].notes = "Tightened spacing".to_string();

    let weeks = aggregate_weeks(&tasks);
    assert_eq!(weeks.len(), 1);
    let week = &weeks[0];
    assert_eq!(week.start, day(2024, 3, 4));
    assert_eq!(week.end, day(2024, 3, 10));
    assert_eq!(week.total(), 3);
    assert_eq!(week.new_designs(), 2);
    assert_eq!(week.iterations(), 1);
    assert_eq!(week.week_number(), 10);
}

#[test]
fn test_weeks_sorted_newest_first() {
    let tasks = vec![
        entry("1", "Mid", day(2024, 3, 13), false),
        entry("2", "Old", day(2024, 1, 2), false),
        entry("3", "New", day(2024, 4, 21), false),
        entry("4", "Mid too", day(2024, 3, 11), true),
    ];

    let weeks = aggregate_weeks(&tasks);
    let starts: Vec<NaiveDate> = weeks.iter().map(|w| w.start).collect();
    assert_eq!(starts, vec![day(2024, 4, 15), day(2024, 3, 11), day(2024, 1, 1)]);
    assert_eq!(weeks[1].total(), 2);
    let total: usize = weeks.iter().map(|w| w.total()).sum();
    assert_eq!(total, tasks.len());
}
