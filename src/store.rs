use chrono::{Duration, NaiveDate};
use tracing::{error, info};
use crate::models::{EntryKind, TaskEntry};
use crate::storage::{load_entries, save_entries, LocalStorage, StoreError};

/// The ordered, append-only collection of entries, mirrored to storage.
#[derive(Debug)]
pub struct TaskStore {
    storage: LocalStorage,
    entries: Vec<TaskEntry>,
}

impl TaskStore {
    /// Rehydrates the store from `storage`.
    ///
    /// Missing data gives an empty store; corrupt data is returned as an error.
    pub fn open(storage: LocalStorage) -> Result<Self, StoreError> {
        let entries = load_entries(&storage)?;
        Ok(TaskStore { storage, entries })
    }

    /// Appends an entry and persists the whole collection.
    ///
    /// Validation is the creation flow's job. If the write fails the entry
    /// stays in memory and the error is returned.
    pub fn append(&mut self, entry: TaskEntry) -> Result<(), StoreError> {
        let id = entry.id.clone();
        let kind = entry.kind();
        self.entries.push(entry);
        if let Err(e) = save_entries(&self.storage, &self.entries) {
            error!("failed to persist entry {}: {}", id, e);
            return Err(e);
        }
        info!("appended {} entry {} ({} total)", kind, id, self.entries.len());
        Ok(())
    }

    /// Every entry, in insertion order.
    pub fn all(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries logged under `date`.
    pub fn for_day(&self, date: NaiveDate) -> Vec<&TaskEntry> {
        self.entries.iter().filter(|e| e.date == date).collect()
    }

    pub fn count_for_day(&self, date: NaiveDate) -> usize {
        self.entries.iter().filter(|e| e.date == date).count()
    }

    /// Entries dated within `[week_start, week_start + 6 days]`.
    pub fn for_week(&self, week_start: NaiveDate) -> Vec<&TaskEntry> {
        let week_end = week_start + Duration::days(6);
        self.entries
            .iter()
            .filter(|e| e.date >= week_start && e.date <= week_end)
            .collect()
    }

    /// Entries of one kind, in insertion order.
    pub fn of_kind(&self, kind: EntryKind) -> Vec<&TaskEntry> {
        self.entries.iter().filter(|e| e.kind() == kind).collect()
    }
}
