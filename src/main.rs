//! # designlog
//!
//! A terminal journal for design-iteration work. Log a rough draft screenshot
//! and, optionally, its final version for any calendar day, add notes, and
//! turn a week of entries into a changelog, locally or with the help of
//! Claude.
//!
//! ## Features
//!
//! *   **Calendar view**: Monday-start weeks with per-day entry counts.
//! *   **New Designs and Iterations**: an entry with only a rough draft is a
//!     new design; adding a final image makes it an iteration.
//! *   **Weekly changelog**: a fixed markdown summary, or an AI-written one
//!     grounded in the week's screenshots.
//! *   **AI descriptions**: describe a draft or compare draft and final.
//! *   **Local storage**: everything lives in one data directory.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! designlog
//! # or explicitly
//! designlog ui
//! ```
//!
//! **Calendar**
//! *   `←/→` or `h/l`: Previous / next day
//! *   `[` / `]`: Previous / next week
//! *   `t`: Today
//! *   `j/k`: Select entry, `Enter`: Details
//! *   `a`: New entry (name, rough image, final image, notes; `Tab` asks AI)
//! *   `s`: Week summary (`g` AI changelog, `b` basic)
//! *   `w`: All weeks (`Enter` jumps to the week)
//! *   `K`: AI settings
//! *   `q`: Quit
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # New design for today
//! designlog add "Homepage Hero" --rough hero.png
//!
//! # Iteration on a given day, with an AI comparison as notes
//! designlog add "Checkout" --rough v1.png --final v2.png --date 2024-03-06 --describe
//!
//! designlog week
//! designlog summary --ai
//! designlog weeks
//! designlog key set sk-ant-...
//! ```
//!
//! ## Data Storage
//!
//! Entries and the API key are saved in your local data directory:
//! *   Linux: `~/.local/share/designlog/`
//! *   macOS: `~/Library/Application Support/designlog/`
//! *   Windows: `%LOCALAPPDATA%\designlog\`
//!
//! Override it with the `DESIGNLOG_DATA_DIR` environment variable. Set
//! `DESIGNLOG_LOG` (e.g. `debug`) to change log verbosity.

use std::io;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tokio::runtime::Runtime;
use designlog::commands::*;
use designlog::logging;
use designlog::tui::run_tui;
use designlog::{AiClient, AiConfig, Credentials, LocalStorage, TaskStore};

#[derive(Parser)]
#[command(name = "designlog")]
#[command(about = "Track your design iterations & changelog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new design entry
    Add {
        /// Entry name (quoted if it has spaces)
        name: String,
        /// Rough draft / V1 image file
        #[arg(short, long)]
        rough: PathBuf,
        /// Final image file; makes the entry an iteration
        #[arg(short = 'F', long = "final")]
        final_image: Option<PathBuf>,
        /// Notes, decisions made or feedback
        #[arg(short, long)]
        notes: Option<String>,
        /// Day to log under, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Ask AI to describe the design (or compare both images)
        #[arg(long)]
        describe: bool,
    },
    /// List entries of a day
    Day {
        /// YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show a week at a glance
    Week {
        /// Any day in the week, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List all weeks with entries, newest first
    Weeks,
    /// Show one entry in detail
    Show {
        /// Entry id or unique id prefix
        id: String,
    },
    /// Print the weekly changelog
    Summary {
        /// Any day in the week, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Let AI write the changelog from the week's screenshots
        #[arg(long)]
        ai: bool,
    },
    /// Send a free-form prompt to the AI
    Ask {
        prompt: String,
    },
    /// Manage the Anthropic API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Save a new API key
    Set {
        key: String,
    },
    /// Remove the saved API key
    Clear,
    /// Show whether AI is connected
    Status,
}

fn runtime() -> Result<Runtime> {
    Runtime::new().context("failed to start async runtime")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = LocalStorage::open_default()?;

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    if interactive {
        logging::init_file(storage.dir())
            .with_context(|| format!("failed to open log file in {}", storage.dir().display()))?;
    } else {
        logging::init_stderr();
    }

    let mut credentials = Credentials::load(storage.clone())?;

    match cli.command {
        Some(Commands::Key { command }) => match command {
            KeyCommands::Set { key } => cmd_key_set(&mut credentials, &key)?,
            KeyCommands::Clear => cmd_key_clear(&mut credentials)?,
            KeyCommands::Status => cmd_key_status(&credentials),
        },
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "designlog", &mut io::stdout());
        }
        Some(Commands::Ask { prompt }) => {
            let client = AiClient::new(AiConfig::from_env(), credentials);
            runtime()?.block_on(cmd_ask(&client, &prompt))?;
        }
        Some(Commands::Add { name, rough, final_image, notes, date, describe }) => {
            let mut store = TaskStore::open(storage)?;
            let client = AiClient::new(AiConfig::from_env(), credentials);
            let args = AddArgs { name, rough, final_image, notes, date, describe };
            runtime()?.block_on(cmd_add(&mut store, &client, args, false))?;
        }
        Some(Commands::Day { date }) => cmd_day(&TaskStore::open(storage)?, date)?,
        Some(Commands::Week { date }) => cmd_week(&TaskStore::open(storage)?, date)?,
        Some(Commands::Weeks) => cmd_weeks(&TaskStore::open(storage)?),
        Some(Commands::Show { id }) => cmd_show(&TaskStore::open(storage)?, &id)?,
        Some(Commands::Summary { date, ai }) => {
            let store = TaskStore::open(storage)?;
            let client = AiClient::new(AiConfig::from_env(), credentials);
            runtime()?.block_on(cmd_summary(&store, &client, date, ai))?;
        }
        Some(Commands::Ui) | None => {
            let store = TaskStore::open(storage)?;
            let client = AiClient::new(AiConfig::from_env(), credentials);
            if let Err(e) = run_tui(store, client) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
    Ok(())
}
