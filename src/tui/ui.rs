use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use chrono::Local;
use crate::calendar::{format_range, format_short, iso_week_number, today, week_dates, week_end};
use crate::changelog::ChangelogSource;
use crate::models::{EntryKind, KindCounts};
use super::app::{AddStep, App, InputMode, Popup};

fn kind_style(kind: EntryKind) -> Style {
    match kind {
        EntryKind::NewDesign => Style::default().fg(Color::Green),
        EntryKind::Iteration => Style::default().fg(Color::Cyan),
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Day pills
            Constraint::Min(0),    // Entries
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_day_pills(f, app, chunks[1]);
    render_entries(f, app, chunks[2]);

    let help_text = match app.input_mode {
        InputMode::Normal => match app.popup {
            Popup::None => "q: Quit | ←/→: Day | [/]: Week | t: Today | j/k: Select | Enter: Details | a: New Entry | s: Week Summary | w: All Weeks | K: AI Settings",
            Popup::Detail(_) => "Esc: Close",
            Popup::Summary => "g: AI Changelog | b: Basic | j/k: Scroll | Esc: Close",
            Popup::AllWeeks => "j/k: Select | Enter: Go to Week | Esc: Close",
        },
        InputMode::Adding => "Enter: Next Step | Tab: AI Describe (notes step) | Esc: Cancel",
        InputMode::EditingKey => "Enter: Save | Ctrl-d: Clear Key | Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[3]);

    if let Popup::Detail(id) = &app.popup {
        render_detail(f, app, id);
    } else if app.popup == Popup::Summary {
        render_summary(f, app);
    } else if app.popup == Popup::AllWeeks {
        render_weeks(f, app);
    }

    match app.input_mode {
        InputMode::Adding => render_add_form(f, app),
        InputMode::EditingKey => render_key_form(f, app),
        InputMode::Normal => {}
    }

    if let Some(alert) = &app.alert {
        let area = centered_rect(60, 5, f.area());
        f.render_widget(Clear, area);
        let p = Paragraph::new(alert.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Notice (any key)"));
        f.render_widget(p, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let ai_status = if app.client.is_configured() {
        Span::styled("AI Connected", Style::default().fg(Color::Green))
    } else {
        Span::styled("Connect AI (K)", Style::default().fg(Color::DarkGray))
    };
    let line = Line::from(vec![
        Span::styled(
            format!("Week {}", iso_week_number(app.week_start)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" · {}   ", format_range(app.week_start, week_end(app.week_start)))),
        ai_status,
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Design Tasks Log"));
    f.render_widget(header, area);
}

fn render_day_pills(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(area);
    let now = today();

    for (i, date) in week_dates(app.week_start).iter().enumerate() {
        let count = app.store.count_for_day(*date);
        let label = match count {
            0 => "—".to_string(),
            1 => "1 entry".to_string(),
            n => format!("{} entries", n),
        };
        let mut style = Style::default();
        if *date == now {
            style = style.fg(Color::Yellow);
        }
        if *date == app.selected_date {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        let pill = Paragraph::new(label)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(date.format("%a %-d").to_string()));
        f.render_widget(pill, cols[i]);
    }
}

fn render_entries(f: &mut Frame, app: &mut App, area: Rect) {
    let title = format_short(app.selected_date);
    let entries = app.day_entries();
    if entries.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled("No entries yet", Style::default().add_modifier(Modifier::BOLD))),
            Line::from("Add your first design log for this day (a)"),
        ])
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = entries
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.kind().badge()).style(kind_style(e.kind())),
                Cell::from(e.created_at.with_timezone(&Local).format("%-I:%M %p").to_string()),
                Cell::from(e.name.clone()),
                Cell::from(if e.final_image.is_some() { "V1 → Final" } else { "Draft" }),
                Cell::from(e.notes.clone()),
                Cell::from(if e.has_ai_description() { "AI" } else { "" }),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Min(20),
        Constraint::Length(11),
        Constraint::Min(20),
        Constraint::Length(3),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Kind", "Time", "Name", "Images", "Notes", ""])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail(f: &mut Frame, app: &App, id: &str) {
    let Some(e) = app.store.find(id) else { return; };
    let area = popup_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(format!("[{}]", e.kind().badge()), kind_style(e.kind()))),
        Line::from(format!("Logged for {}", format_short(e.date))),
        Line::from(""),
    ];
    let draft_label = if e.kind() == EntryKind::Iteration { "V1 Draft" } else { "Design" };
    lines.push(Line::from(format!("{}: {} ({} bytes)", draft_label, e.rough_image.media_type(), e.rough_image.byte_len())));
    if let Some(final_image) = &e.final_image {
        lines.push(Line::from(format!("Final: {} ({} bytes)", final_image.media_type(), final_image.byte_len())));
    }
    if e.has_notes() {
        lines.push(Line::from(""));
        let title = if e.has_ai_description() { "Notes (AI)" } else { "Notes" };
        lines.push(Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))));
        lines.push(Line::from(e.notes.clone()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Created {}", e.created_at.with_timezone(&Local).format("%-m/%-d/%Y, %-I:%M:%S %p")),
        Style::default().fg(Color::Gray),
    )));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(e.name.clone()));
    f.render_widget(p, area);
}

fn render_summary(f: &mut Frame, app: &App) {
    let area = popup_rect(80, 80, f.area());
    f.render_widget(Clear, area);

    let counts = KindCounts::tally(app.week_entries());
    let source = match app.summary.as_ref().map(|s| s.source) {
        Some(ChangelogSource::Ai) => " · AI",
        _ => "",
    };
    let mut lines = vec![
        Line::from(format!(
            "Total {} · New Designs {} · Iterations {}{}",
            counts.total(),
            counts.new_designs,
            counts.iterations,
            source
        )),
        Line::from(""),
    ];
    if let Some(summary) = &app.summary {
        lines.extend(summary.text.lines().map(|l| Line::from(l.to_string())));
    }

    let title = format!(
        "Week {} Summary · {}",
        iso_week_number(app.week_start),
        format_range(app.week_start, week_end(app.week_start))
    );
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.summary_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn render_weeks(f: &mut Frame, app: &mut App) {
    let area = popup_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    if app.weeks.is_empty() {
        let p = Paragraph::new("No entries logged yet.")
            .block(Block::default().borders(Borders::ALL).title("All Weeks"));
        f.render_widget(p, area);
        return;
    }

    let rows: Vec<Row> = app
        .weeks
        .iter()
        .map(|b| {
            let counts = b.counts();
            Row::new(vec![
                Cell::from(format!("Week {}", b.week_number())),
                Cell::from(format_range(b.start, b.end)),
                Cell::from(format!("{} entries", b.total())),
                Cell::from(format!("{} new", counts.new_designs)),
                Cell::from(format!("{} iterations", counts.iterations)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(24),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title("All Weeks"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.weeks_state);
}

fn render_add_form(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 4, f.area());
    f.render_widget(Clear, area);

    let date = format_short(app.add_state.draft.date);
    let title = match app.add_state.step {
        AddStep::Name => format!("New Entry ({}): Entry Name", date),
        AddStep::RoughImage => format!("New Entry ({}): Rough Draft / V1 image path", date),
        AddStep::FinalImage => format!("New Entry ({}): Final image path (Optional, Enter to skip)", date),
        AddStep::Notes => format!("New Entry ({}): Notes (Optional, Tab for AI)", date),
    };

    let status = match &app.add_state.error {
        Some(err) => Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))),
        None if app.add_state.step == AddStep::Notes => {
            let hint = if app.add_state.draft.final_image.is_some() {
                "Iteration: rough + final"
            } else {
                "New design: rough only"
            };
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray)))
        }
        None => Line::from(""),
    };

    let input = Paragraph::new(vec![
        Line::from(Span::styled(app.input_buffer.clone(), Style::default().fg(Color::Yellow))),
        status,
    ])
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn render_key_form(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 4, f.area());
    f.render_widget(Clear, area);

    let current = match app.client.credentials().masked() {
        Some(masked) => format!("Current key: {}", masked),
        None => "No key set. AI features are disabled.".to_string(),
    };
    let hidden = "•".repeat(app.input_buffer.chars().count());
    let input = Paragraph::new(vec![
        Line::from(Span::styled(hidden, Style::default().fg(Color::Yellow))),
        Line::from(Span::styled(current, Style::default().fg(Color::Gray))),
    ])
    .block(Block::default().borders(Borders::ALL).title("AI Settings: Anthropic API Key"));

    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}

fn popup_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ].as_ref())
        .split(r);

    centered_rect(percent_x, popup_layout[1].height, popup_layout[1])
}
