pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Runtime;
use crate::ai::AiClient;
use crate::store::TaskStore;
use app::{App, InputMode, Popup};
use ui::ui;

pub fn run_tui(store: TaskStore, client: AiClient) -> Result<(), Box<dyn Error>> {
    let runtime = Runtime::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, client, runtime);

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.alert.is_some() {
                app.alert = None;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => {
                    if handle_normal_key(app, key) {
                        return Ok(());
                    }
                }
                InputMode::Adding | InputMode::EditingKey => match key.code {
                    KeyCode::Enter => app.handle_input(),
                    KeyCode::Esc => app.cancel_input(),
                    KeyCode::Tab => app.describe_with_ai(),
                    KeyCode::Char('d')
                        if key.modifiers.contains(KeyModifiers::CONTROL)
                            && app.input_mode == InputMode::EditingKey =>
                    {
                        app.clear_key()
                    }
                    KeyCode::Char(c) => {
                        app.input_buffer.push(c);
                    }
                    KeyCode::Backspace => {
                        app.input_buffer.pop();
                    }
                    _ => {}
                },
            }
        }
    }
}

/// Returns `true` when the app should quit.
fn handle_normal_key(app: &mut App, key: KeyEvent) -> bool {
    match app.popup {
        Popup::None => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Left | KeyCode::Char('h') => app.previous_day(),
            KeyCode::Right | KeyCode::Char('l') => app.next_day(),
            KeyCode::Char('[') => app.navigate_week(-1),
            KeyCode::Char(']') => app.navigate_week(1),
            KeyCode::Char('t') => app.go_to_today(),
            KeyCode::Enter => app.open_detail(),
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('s') => app.open_summary(),
            KeyCode::Char('w') => app.open_weeks(),
            KeyCode::Char('K') => app.start_edit_key(),
            _ => {}
        },
        Popup::Detail(_) => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_popup(),
            _ => {}
        },
        Popup::Summary => match key.code {
            KeyCode::Char('g') => app.generate_ai_summary(),
            KeyCode::Char('b') => app.show_basic_summary(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_summary(1),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_summary(-1),
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => app.close_popup(),
            _ => {}
        },
        Popup::AllWeeks => match key.code {
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Enter => app.jump_to_selected_week(),
            KeyCode::Esc | KeyCode::Char('w') | KeyCode::Char('q') => app.close_popup(),
            _ => {}
        },
    }
    false
}
