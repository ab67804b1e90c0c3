pub mod ai;
pub mod calendar;
pub mod changelog;
pub mod commands;
pub mod config;
pub mod image;
pub mod logging;
pub mod models;
pub mod storage;
pub mod store;
pub mod tui;
pub mod weeks;

pub use ai::{AiClient, AiError};
pub use config::{AiConfig, Credentials};
pub use models::{EntryDraft, EntryKind, TaskEntry};
pub use storage::{LocalStorage, StoreError};
pub use store::TaskStore;
