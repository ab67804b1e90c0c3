use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crate::ai::{AiClient, AiError};
use crate::calendar::{format_range, format_short, iso_week_number, today, week_dates, week_end, week_start};
use crate::changelog::{weekly_changelog, ChangelogSource};
use crate::config::Credentials;
use crate::image::ImageData;
use crate::models::{EntryDraft, EntryKind, KindCounts, TaskEntry};
use crate::store::TaskStore;
use crate::weeks::aggregate_weeks;

const NOTES_PREVIEW_CHARS: usize = 48;

/// Fields collected by `designlog add`.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub name: String,
    pub rough: PathBuf,
    pub final_image: Option<PathBuf>,
    pub notes: Option<String>,
    pub date: Option<String>,
    pub describe: bool,
}

/// Parses `YYYY-MM-DD`, defaulting to today.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", s)),
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// User-facing text for an AI failure.
pub fn ai_error_message(err: &AiError) -> String {
    match err {
        AiError::NotConfigured => "Please add your Anthropic API key first (designlog key set <KEY>).".to_string(),
        AiError::RequestFailed(msg) => format!("AI Error: {}", msg),
    }
}

/// Asks the AI service about a draft's images and records the answer.
///
/// A draft with both images is compared; one with only a rough image is
/// described. Drafts without a rough image are left untouched.
pub async fn describe_draft(client: &AiClient, draft: &mut EntryDraft) -> Result<(), AiError> {
    let Some(rough) = &draft.rough_image else {
        return Ok(());
    };
    let description = match &draft.final_image {
        Some(final_image) => client.compare_images(rough, final_image).await?,
        None => client.describe_image(rough).await?,
    };
    draft.apply_ai_description(description);
    Ok(())
}

/// Creates a new entry and appends it to the store.
///
/// Returns the new entry's id.
pub async fn cmd_add(store: &mut TaskStore, client: &AiClient, args: AddArgs, silent: bool) -> Result<String> {
    let date = parse_date(args.date.as_deref())?;
    let mut draft = EntryDraft::new(date);
    draft.name = args.name;
    draft.notes = args.notes.unwrap_or_default();
    draft.rough_image = Some(ImageData::from_path(&args.rough)?);
    if let Some(path) = &args.final_image {
        draft.final_image = Some(ImageData::from_path(path)?);
    }

    if args.describe {
        if let Err(e) = describe_draft(client, &mut draft).await {
            if !silent { eprintln!("{}", ai_error_message(&e)); }
        }
    }

    let Some(entry) = draft.into_entry(Utc::now()) else {
        bail!("An entry needs a name and a rough image.");
    };
    let id = entry.id.clone();
    let kind = entry.kind();
    store.append(entry)?;
    if !silent { println!("{} added for {} (id = {})", kind, format_short(date), short_id(&id)); }
    Ok(id)
}

fn kind_cell(kind: EntryKind) -> Cell {
    let color = match kind {
        EntryKind::NewDesign => Color::Green,
        EntryKind::Iteration => Color::Cyan,
    };
    Cell::new(kind.badge()).fg(color)
}

fn notes_preview(entry: &TaskEntry) -> String {
    let mut preview: String = entry.notes.chars().take(NOTES_PREVIEW_CHARS).collect();
    if entry.notes.chars().count() > NOTES_PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}

fn entries_table(entries: &[&TaskEntry], with_day: bool) -> Table {
    let mut header = vec![Cell::new("ID").add_attribute(Attribute::Bold)];
    if with_day {
        header.push(Cell::new("Day").add_attribute(Attribute::Bold));
    }
    header.extend([
        Cell::new("Kind").add_attribute(Attribute::Bold),
        Cell::new("Time").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Notes").add_attribute(Attribute::Bold),
        Cell::new("AI").add_attribute(Attribute::Bold),
    ]);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for e in entries {
        let mut row = vec![Cell::new(short_id(&e.id))];
        if with_day {
            row.push(Cell::new(e.date.format("%a %-d")));
        }
        row.extend([
            kind_cell(e.kind()),
            Cell::new(e.created_at.with_timezone(&Local).format("%-I:%M %p")),
            Cell::new(&e.name),
            Cell::new(notes_preview(e)),
            Cell::new(if e.has_ai_description() { "✓" } else { "" }),
        ]);
        table.add_row(row);
    }
    table
}

/// Lists the entries logged under one day.
pub fn cmd_day(store: &TaskStore, date: Option<String>) -> Result<()> {
    let date = parse_date(date.as_deref())?;
    let entries = store.for_day(date);
    println!("{}", format_short(date));
    if entries.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }
    println!("{}", entries_table(&entries, false));
    Ok(())
}

/// Shows one week: day counts followed by every entry in it.
pub fn cmd_week(store: &TaskStore, date: Option<String>) -> Result<()> {
    let date = parse_date(date.as_deref())?;
    let start = week_start(date);
    let days = week_dates(date);
    let now = today();

    println!("Week {} · {}", iso_week_number(start), format_range(start, week_end(date)));

    let mut pills = Table::new();
    pills.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    pills.set_header(days.iter().map(|d| {
        let cell = Cell::new(d.format("%a %-d"));
        if *d == now { cell.add_attribute(Attribute::Bold).fg(Color::Yellow) } else { cell }
    }));
    pills.add_row(days.iter().map(|d| match store.count_for_day(*d) {
        0 => Cell::new("—"),
        1 => Cell::new("1 entry"),
        n => Cell::new(format!("{} entries", n)),
    }));
    println!("{pills}");

    let entries = store.for_week(start);
    let counts = KindCounts::tally(entries.iter().copied());
    println!("{} entries · {} new · {} iterations", counts.total(), counts.new_designs, counts.iterations);
    if !entries.is_empty() {
        println!("{}", entries_table(&entries, true));
    }
    Ok(())
}

/// Lists every week that has entries, newest first.
pub fn cmd_weeks(store: &TaskStore) {
    let buckets = aggregate_weeks(store.all());
    if buckets.is_empty() {
        println!("No entries logged yet.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Week").add_attribute(Attribute::Bold),
            Cell::new("Dates").add_attribute(Attribute::Bold),
            Cell::new("Entries").add_attribute(Attribute::Bold),
            Cell::new("New").add_attribute(Attribute::Bold),
            Cell::new("Iterations").add_attribute(Attribute::Bold),
        ]);
    for b in buckets {
        let counts = b.counts();
        table.add_row(vec![
            Cell::new(format!("Week {}", b.week_number())),
            Cell::new(format_range(b.start, b.end)),
            Cell::new(b.total()),
            Cell::new(counts.new_designs).fg(Color::Green),
            Cell::new(counts.iterations).fg(Color::Cyan),
        ]);
    }
    println!("{table}");
}

/// Finds an entry by full id or unique id prefix.
pub fn resolve_entry<'a>(store: &'a TaskStore, id: &str) -> Result<&'a TaskEntry> {
    if let Some(e) = store.find(id) {
        return Ok(e);
    }
    let matches: Vec<&TaskEntry> = store.all().iter().filter(|e| e.id.starts_with(id)).collect();
    match matches.as_slice() {
        [one] => Ok(*one),
        [] => bail!("Entry {} not found.", id),
        _ => bail!("Entry id {} is ambiguous ({} matches).", id, matches.len()),
    }
}

/// Prints everything recorded for one entry.
pub fn cmd_show(store: &TaskStore, id: &str) -> Result<()> {
    let e = resolve_entry(store, id)?;
    println!("{} [{}]", e.name, e.kind().badge());
    println!("Logged for: {}", format_short(e.date));
    let draft_label = if e.kind() == EntryKind::Iteration { "V1 Draft" } else { "Design" };
    println!("{}: {} ({} bytes)", draft_label, e.rough_image.media_type(), e.rough_image.byte_len());
    if let Some(final_image) = &e.final_image {
        println!("Final: {} ({} bytes)", final_image.media_type(), final_image.byte_len());
    }
    if e.has_notes() {
        let tag = if e.has_ai_description() { " (AI)" } else { "" };
        println!("\nNotes{}:\n{}", tag, e.notes);
    }
    println!("\nCreated {}", e.created_at.with_timezone(&Local).format("%-m/%-d/%Y, %-I:%M:%S %p"));
    println!("ID {}", e.id);
    Ok(())
}

/// Prints the changelog for the week containing `date`.
pub async fn cmd_summary(store: &TaskStore, client: &AiClient, date: Option<String>, use_ai: bool) -> Result<()> {
    let date = parse_date(date.as_deref())?;
    let start = week_start(date);
    let end = week_end(date);
    let entries = store.for_week(start);
    let counts = KindCounts::tally(entries.iter().copied());

    println!("Week {} Summary · {}", iso_week_number(start), format_range(start, end));
    println!("Total {} · New Designs {} · Iterations {}\n", counts.total(), counts.new_designs, counts.iterations);
    if use_ai && entries.is_empty() {
        eprintln!("No entries this week; AI changelog skipped.");
    }

    let changelog = weekly_changelog(client, &entries, start, end, use_ai).await;
    if let Some(err) = &changelog.error {
        eprintln!("{}", ai_error_message(err));
    }
    if changelog.source == ChangelogSource::Ai {
        eprintln!("(AI generated)");
    }
    println!("{}", changelog.text);
    Ok(())
}

/// Sends a free-form prompt and prints the answer.
pub async fn cmd_ask(client: &AiClient, prompt: &str) -> Result<()> {
    match client.generate_text(prompt).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => bail!(ai_error_message(&e)),
    }
}

pub fn cmd_key_set(credentials: &mut Credentials, key: &str) -> Result<()> {
    credentials.set(key)?;
    if credentials.is_configured() {
        println!("AI connected.");
    } else {
        println!("Empty key given; API key cleared.");
    }
    Ok(())
}

pub fn cmd_key_clear(credentials: &mut Credentials) -> Result<()> {
    credentials.clear()?;
    println!("API key cleared.");
    Ok(())
}

pub fn cmd_key_status(credentials: &Credentials) {
    match credentials.masked() {
        Some(masked) => println!("AI connected ({}).", masked),
        None => println!("AI not connected. Run `designlog key set <KEY>` to enable AI features."),
    }
}
