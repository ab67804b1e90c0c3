use std::fmt;
use tracing::info;
use crate::storage::{LocalStorage, StoreError, API_KEY_KEY};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Endpoint settings for the AI client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_url: String,
    pub api_version: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AiConfig {
    /// Defaults, overridden by `DESIGNLOG_API_URL` and `DESIGNLOG_MODEL`.
    pub fn from_env() -> Self {
        let mut config = AiConfig::default();
        if let Ok(url) = std::env::var("DESIGNLOG_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = std::env::var("DESIGNLOG_MODEL") {
            config.model = model;
        }
        config
    }
}

/// The AI vendor credential.
///
/// When backed by storage, `set` and `clear` write through to the
/// `claude-api-key` key.
#[derive(Clone)]
pub struct Credentials {
    storage: Option<LocalStorage>,
    api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl Credentials {
    /// Reads the stored credential.
    pub fn load(storage: LocalStorage) -> Result<Self, StoreError> {
        let api_key = storage.get_item(API_KEY_KEY)?.and_then(normalize);
        Ok(Credentials { storage: Some(storage), api_key })
    }

    /// A credential that lives only in memory.
    pub fn from_key(api_key: Option<String>) -> Self {
        Credentials { storage: None, api_key: api_key.and_then(normalize) }
    }

    pub fn get(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Stores a new key. A blank key clears the credential.
    pub fn set(&mut self, api_key: &str) -> Result<(), StoreError> {
        let Some(key) = normalize(api_key.to_string()) else {
            return self.clear();
        };
        if let Some(storage) = &self.storage {
            storage.set_item(API_KEY_KEY, &key)?;
        }
        self.api_key = Some(key);
        info!("API key saved");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        if let Some(storage) = &self.storage {
            storage.remove_item(API_KEY_KEY)?;
        }
        self.api_key = None;
        info!("API key cleared");
        Ok(())
    }

    /// The key with everything but its ends hidden, for display.
    pub fn masked(&self) -> Option<String> {
        let key = self.api_key.as_deref()?;
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 8 {
            return Some("*".repeat(chars.len()));
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        Some(format!("{}…{}", head, tail))
    }
}

fn normalize(key: String) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_write_through() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();

        let mut creds = Credentials::load(storage.clone()).unwrap();
        assert!(!creds.is_configured());

        creds.set("  sk-ant-test-123456  ").unwrap();
        assert_eq!(creds.get(), Some("sk-ant-test-123456"));
        let reloaded = Credentials::load(storage.clone()).unwrap();
        assert_eq!(reloaded.get(), Some("sk-ant-test-123456"));

        creds.clear().unwrap();
        assert!(!Credentials::load(storage).unwrap().is_configured());
    }

    #[test]
    fn blank_key_is_unconfigured() {
        assert!(!Credentials::from_key(Some("   ".into())).is_configured());
        let mut creds = Credentials::from_key(Some("abc".into()));
        creds.set("").unwrap();
        assert!(!creds.is_configured());
    }

    #[test]
    fn masked_hides_middle() {
        let creds = Credentials::from_key(Some("sk-ant-abcdefgh".into()));
        assert_eq!(creds.masked().as_deref(), Some("sk-a…efgh"));
        assert!(!format!("{:?}", creds).contains("abcdefgh"));
    }
}
