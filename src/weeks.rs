use std::collections::BTreeMap;
use chrono::{Duration, NaiveDate};
use crate::calendar::{iso_week_number, week_start};
use crate::models::{KindCounts, TaskEntry};

/// Entries falling inside one Monday-start week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekBucket {
    /// The Monday opening the week.
    pub start: NaiveDate,
    /// The Sunday closing it.
    pub end: NaiveDate,
    pub tasks: Vec<TaskEntry>,
}

impl WeekBucket {
    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn counts(&self) -> KindCounts {
        KindCounts::tally(&self.tasks)
    }

    pub fn new_designs(&self) -> usize {
        self.counts().new_designs
    }

    pub fn iterations(&self) -> usize {
        self.counts().iterations
    }

    pub fn week_number(&self) -> u32 {
        iso_week_number(self.start)
    }
}

/// Groups entries by week, most recent week first.
///
/// Entries inside a bucket keep their input order.
pub fn aggregate_weeks(tasks: &[TaskEntry]) -> Vec<WeekBucket> {
    let mut groups: BTreeMap<NaiveDate, Vec<TaskEntry>> = BTreeMap::new();
    for t in tasks {
        groups.entry(week_start(t.date)).or_default().push(t.clone());
    }
    groups
        .into_iter()
        .rev()
        .map(|(start, tasks)| WeekBucket {
            start,
            end: start + Duration::days(6),
            tasks,
        })
        .collect()
}
