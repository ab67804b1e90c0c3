use std::fmt::Write;
use chrono::NaiveDate;
use tracing::warn;
use crate::ai::{AiClient, AiError};
use crate::calendar::{format_short, iso_week_number};
use crate::models::{EntryKind, TaskEntry};

/// Where a changelog's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogSource {
    Basic,
    Ai,
}

/// A generated weekly changelog.
///
/// `error` holds the AI failure when an AI changelog was requested but the
/// basic text had to be used instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Changelog {
    pub text: String,
    pub source: ChangelogSource,
    pub error: Option<AiError>,
}

/// Renders the fixed-format markdown changelog.
///
/// Sections appear only when they have entries, in input order.
pub fn basic_changelog(tasks: &[&TaskEntry], week_start: NaiveDate, week_end: NaiveDate) -> String {
    let created: Vec<&TaskEntry> = tasks.iter().copied().filter(|t| t.kind() == EntryKind::NewDesign).collect();
    let iterated: Vec<&TaskEntry> = tasks.iter().copied().filter(|t| t.kind() == EntryKind::Iteration).collect();

    let mut log = String::new();
    let _ = writeln!(log, "## Week {} Design Changelog", iso_week_number(week_start));
    let _ = writeln!(log, "**{} – {}**", format_short(week_start), format_short(week_end));
    log.push('\n');

    if !created.is_empty() {
        let _ = writeln!(log, "### ✨ New Designs ({})", created.len());
        for t in &created {
            let _ = write!(log, "- **{}**", t.name);
            if t.has_notes() {
                let _ = write!(log, " — {}", t.notes);
            }
            log.push('\n');
        }
        log.push('\n');
    }

    if !iterated.is_empty() {
        let _ = writeln!(log, "### 🔄 Iterations ({})", iterated.len());
        for t in &iterated {
            let _ = write!(log, "- **{}** — V1 → Final", t.name);
            if t.has_notes() {
                let _ = write!(log, " ({})", t.notes);
            }
            log.push('\n');
        }
        log.push('\n');
    }

    let _ = write!(log, "---\n*Total: {} entries*", tasks.len());
    log
}

/// Asks the AI service for the changelog and returns its text verbatim.
pub async fn ai_changelog(
    client: &AiClient,
    tasks: &[&TaskEntry],
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Result<String, AiError> {
    client.generate_weekly_changelog(tasks, week_start, week_end).await
}

/// Produces the week's changelog, using the AI service when asked.
///
/// The AI path is skipped for an empty week. If it fails, the basic text is
/// returned with the error attached so the caller can report it.
pub async fn weekly_changelog(
    client: &AiClient,
    tasks: &[&TaskEntry],
    week_start: NaiveDate,
    week_end: NaiveDate,
    use_ai: bool,
) -> Changelog {
    if !use_ai || tasks.is_empty() {
        return Changelog {
            text: basic_changelog(tasks, week_start, week_end),
            source: ChangelogSource::Basic,
            error: None,
        };
    }
    match ai_changelog(client, tasks, week_start, week_end).await {
        Ok(text) => Changelog { text, source: ChangelogSource::Ai, error: None },
        Err(e) => {
            warn!("AI changelog failed, falling back to basic summary: {}", e);
            Changelog {
                text: basic_changelog(tasks, week_start, week_end),
                source: ChangelogSource::Basic,
                error: Some(e),
            }
        }
    }
}
