use std::fs;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use designlog::commands::*;
use designlog::storage::LocalStorage;
use designlog::{AiClient, AiConfig, Credentials, EntryKind, TaskStore};
use tempfile::TempDir;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn with_test_store<F>(f: F)
where
    F: FnOnce(&Path, TaskStore, AiClient),
{
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::open(dir.path()).unwrap();
    let store = TaskStore::open(storage).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));
    f(dir.path(), store, client);
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(name.as_bytes());
    fs::write(&path, bytes).unwrap();
    path
}

fn add_args(name: &str, rough: PathBuf) -> AddArgs {
    AddArgs {
        name: name.to_string(),
        rough,
        final_image: None,
        notes: None,
        date: Some("2024-03-06".to_string()),
        describe: false,
    }
}

#[tokio::test]
async fn test_add_new_design() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::open(dir.path()).unwrap();
    let mut store = TaskStore::open(storage.clone()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));
    let rough = write_png(dir.path(), "hero.png");

    let mut args = add_args("  Homepage Hero ", rough);
    args.notes = Some("First pass".to_string());
    let id = cmd_add(&mut store, &client, args, true).await.unwrap();

    let reopened = TaskStore::open(storage).unwrap();
    assert_eq!(reopened.len(), 1);
    let entry = reopened.find(&id).unwrap();
    assert_eq!(entry.name, "Homepage Hero");
    assert_eq!(entry.notes, "First pass");
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    assert_eq!(entry.kind(), EntryKind::NewDesign);
    assert_eq!(entry.rough_image.media_type(), "image/png");
}

#[tokio::test]
async fn test_add_iteration() {
    let dir = TempDir::new().unwrap();
    let mut store = TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));

    let mut args = add_args("Checkout", write_png(dir.path(), "v1.png"));
    args.final_image = Some(write_png(dir.path(), "v2.png"));
    let id = cmd_add(&mut store, &client, args, true).await.unwrap();

    let entry = store.find(&id).unwrap();
    assert_eq!(entry.kind(), EntryKind::Iteration);
    assert_ne!(entry.final_image, Some(entry.rough_image.clone()));
}

#[tokio::test]
async fn test_add_with_describe_and_no_key_still_saves() {
    let dir = TempDir::new().unwrap();
    let mut store = TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));

    let mut args = add_args("Settings", write_png(dir.path(), "settings.png"));
    args.describe = true;
    let id = cmd_add(&mut store, &client, args, true).await.unwrap();

    let entry = store.find(&id).unwrap();
    assert!(!entry.has_ai_description());
    assert!(!entry.has_notes());
}

#[tokio::test]
async fn test_add_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    let mut store = TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));

    let args = add_args("   ", write_png(dir.path(), "blank.png"));
    assert!(cmd_add(&mut store, &client, args, true).await.is_err());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_add_rejects_non_image() {
    let dir = TempDir::new().unwrap();
    let mut store = TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "just text").unwrap();

    assert!(cmd_add(&mut store, &client, add_args("Notes", notes), true).await.is_err());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_add_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    let mut store = TaskStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
    let client = AiClient::new(AiConfig::default(), Credentials::from_key(None));

    let mut args = add_args("Hero", write_png(dir.path(), "hero.png"));
    args.date = Some("06/03/2024".to_string());
    let err = cmd_add(&mut store, &client, args, true).await.unwrap_err();
    assert!(err.to_string().contains("YYYY-MM-DD"));
}

#[test]
fn test_resolve_entry_by_prefix() {
    with_test_store(|dir, mut store, client| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let first = rt
            .block_on(cmd_add(&mut store, &client, add_args("One", write_png(dir, "one.png")), true))
            .unwrap();
        let second = rt
            .block_on(cmd_add(&mut store, &client, add_args("Two", write_png(dir, "two.png")), true))
            .unwrap();

        assert_eq!(resolve_entry(&store, &first).unwrap().name, "One");
        assert_eq!(resolve_entry(&store, short_id(&second)).unwrap().name, "Two");
        assert!(resolve_entry(&store, "not-an-id").is_err());
        // Every uuid matches the empty prefix.
        assert!(resolve_entry(&store, "").is_err());
    });
}

#[test]
fn test_views_on_empty_store() {
    with_test_store(|_, store, _| {
        cmd_day(&store, None).unwrap();
        cmd_week(&store, Some("2024-03-06".to_string())).unwrap();
        cmd_weeks(&store);
        assert!(cmd_show(&store, "missing").is_err());
        assert!(cmd_day(&store, Some("yesterday".to_string())).is_err());
    });
}

#[test]
fn test_key_set_and_clear_persist() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::open(dir.path()).unwrap();
    let mut credentials = Credentials::load(storage.clone()).unwrap();
    assert!(!credentials.is_configured());

    cmd_key_set(&mut credentials, "  sk-ant-abcdefgh1234  ").unwrap();
    let reloaded = Credentials::load(storage.clone()).unwrap();
    assert_eq!(reloaded.get(), Some("sk-ant-abcdefgh1234"));

    cmd_key_clear(&mut credentials).unwrap();
    assert!(!Credentials::load(storage).unwrap().is_configured());
}

#[test]
fn test_ai_error_messages() {
    use designlog::AiError;
    assert!(ai_error_message(&AiError::NotConfigured).contains("API key"));
    assert_eq!(ai_error_message(&AiError::RequestFailed("boom".into())), "AI Error: boom");
}
