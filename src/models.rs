use std::fmt;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::image::ImageData;

/// One logged design unit for a calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// Display title.
    pub name: String,
    /// The first draft. Every entry has one.
    pub rough_image: ImageData,
    /// The finished version, present only for iterations.
    #[serde(default)]
    pub final_image: Option<ImageData>,
    /// Free-text annotation, user- or AI-authored.
    #[serde(default)]
    pub notes: String,
    /// Text returned by the AI service when it was asked about this entry.
    #[serde(default)]
    pub ai_description: String,
    /// The calendar day the entry is logged under.
    #[serde(with = "entry_date")]
    pub date: NaiveDate,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

/// Whether an entry is a fresh design or an iteration on a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    NewDesign,
    Iteration,
}

impl EntryKind {
    /// Badge text used in lists.
    pub fn badge(self) -> &'static str {
        match self {
            EntryKind::NewDesign => "Created",
            EntryKind::Iteration => "Iterated",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::NewDesign => write!(f, "New Design"),
            EntryKind::Iteration => write!(f, "Iteration"),
        }
    }
}

impl TaskEntry {
    /// The entry kind. This is the only place the rule is written down.
    pub fn kind(&self) -> EntryKind {
        if self.final_image.is_some() {
            EntryKind::Iteration
        } else {
            EntryKind::NewDesign
        }
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn has_ai_description(&self) -> bool {
        !self.ai_description.is_empty()
    }
}

/// Number of new designs and iterations in a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub new_designs: usize,
    pub iterations: usize,
}

impl KindCounts {
    pub fn tally<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskEntry>,
    {
        entries.into_iter().fold(KindCounts::default(), |mut acc, e| {
            match e.kind() {
                EntryKind::NewDesign => acc.new_designs += 1,
                EntryKind::Iteration => acc.iterations += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.new_designs + self.iterations
    }
}

/// Partially filled entry from the creation flow.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub name: String,
    pub rough_image: Option<ImageData>,
    pub final_image: Option<ImageData>,
    pub notes: String,
    pub ai_description: String,
    pub date: NaiveDate,
}

impl EntryDraft {
    pub fn new(date: NaiveDate) -> Self {
        EntryDraft {
            name: String::new(),
            rough_image: None,
            final_image: None,
            notes: String::new(),
            ai_description: String::new(),
            date,
        }
    }

    /// Saving needs a non-blank name and a rough image.
    pub fn can_save(&self) -> bool {
        !self.name.trim().is_empty() && self.rough_image.is_some()
    }

    /// Records an AI description, also using it as the notes if none were written.
    pub fn apply_ai_description(&mut self, description: String) {
        if self.notes.trim().is_empty() {
            self.notes = description.clone();
        }
        self.ai_description = description;
    }

    /// Finishes the draft. Returns `None` if it cannot be saved yet.
    pub fn into_entry(self, now: DateTime<Utc>) -> Option<TaskEntry> {
        if !self.can_save() {
            return None;
        }
        let rough_image = self.rough_image?;
        Some(TaskEntry {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            rough_image,
            final_image: self.final_image,
            notes: self.notes.trim().to_string(),
            ai_description: self.ai_description.trim().to_string(),
            date: self.date,
            created_at: now,
        })
    }
}

/// Parses a stored entry date.
///
/// Accepts `YYYY-MM-DD` as well as full RFC 3339 timestamps, which older
/// logs wrote; those are read as the local calendar day.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

mod entry_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_entry_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid entry date `{}`", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EntryDraft {
        EntryDraft::new(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
    }

    #[test]
    fn kind_follows_final_image() {
        let mut d = draft();
        d.name = "Hero".into();
        d.rough_image = Some(ImageData::from_bytes("image/png", b"v1"));
        let entry = d.clone().into_entry(Utc::now()).unwrap();
        assert_eq!(entry.kind(), EntryKind::NewDesign);

        d.final_image = Some(ImageData::from_bytes("image/png", b"v2"));
        let entry = d.into_entry(Utc::now()).unwrap();
        assert_eq!(entry.kind(), EntryKind::Iteration);
    }

    #[test]
    fn draft_needs_name_and_rough_image() {
        let mut d = draft();
        assert!(!d.can_save());
        d.name = "   ".into();
        d.rough_image = Some(ImageData::from_bytes("image/png", b"v1"));
        assert!(!d.can_save());
        assert!(d.clone().into_entry(Utc::now()).is_none());
        d.name = "  Checkout  ".into();
        assert!(d.can_save());
        assert_eq!(d.into_entry(Utc::now()).unwrap().name, "Checkout");
    }

    #[test]
    fn ai_description_fills_empty_notes_only() {
        let mut d = draft();
        d.apply_ai_description("A login screen.".into());
        assert_eq!(d.notes, "A login screen.");

        let mut d = draft();
        d.notes = "mine".into();
        d.apply_ai_description("A login screen.".into());
        assert_eq!(d.notes, "mine");
        assert_eq!(d.ai_description, "A login screen.");
    }

    #[test]
    fn entry_dates_accept_plain_and_timestamp_forms() {
        assert_eq!(parse_entry_date("2024-03-06"), NaiveDate::from_ymd_opt(2024, 3, 6));
        // Midday UTC lands on the same calendar day in any common offset.
        assert_eq!(parse_entry_date("2024-03-06T12:00:00.000Z"), NaiveDate::from_ymd_opt(2024, 3, 6));
        assert_eq!(parse_entry_date("yesterday"), None);
    }
}
