use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Persistent home of the bearer token, shared by every page.
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored token
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token persisted as JSON in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let stored: StoredSession =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        debug!(saved_at = %stored.saved_at, "Session file loaded");
        Ok(Some(stored.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// In-process token store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "touradmin-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = scratch_dir("roundtrip");
        let store = FileTokenStore::new(dir.clone());

        assert_eq!(store.load().expect("load empty"), None);

        store.save("abc.def.ghi").expect("save");
        assert_eq!(store.load().expect("load"), Some("abc.def.ghi".to_string()));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load cleared"), None);

        // Clearing twice is fine
        store.clear().expect("clear again");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = scratch_dir("corrupt");
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join(SESSION_FILE), "not json").expect("write");

        let store = FileTokenStore::new(dir.clone());
        assert!(store.load().is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::with_token("t1");
        assert_eq!(store.load().expect("load"), Some("t1".to_string()));
        store.save("t2").expect("save");
        assert_eq!(store.load().expect("load"), Some("t2".to_string()));
        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }
}
