use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

pub const TOKEN_KEY: &str = "flicklist.token";
pub const USER_KEY: &str = "flicklist.user";
pub const NEXT_DAILY_CLEAR_KEY: &str = "flicklist.next_daily_clear";
pub const WATCHED_INDICATORS_KEY: &str = "watched_indicators";

/// Values the addon writes to mean "no value"
const EMPTY_VALUES: [&str; 3] = ["", "0", "empty_setting"];

/// Persisted string key-value settings shared with the host.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value; implementations persist before returning
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
            .filter(|token| !EMPTY_VALUES.contains(&token.as_str()))
    }

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Unix seconds of the next daily cache sweep; 0 when never scheduled
    fn next_daily_clear(&self) -> i64 {
        self.get(NEXT_DAILY_CLEAR_KEY)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn set_next_daily_clear(&self, epoch_seconds: i64) -> Result<()> {
        self.set(NEXT_DAILY_CLEAR_KEY, &epoch_seconds.to_string())
    }

    fn next_daily_clear_at(&self) -> Option<DateTime<Utc>> {
        match self.next_daily_clear() {
            0 => None,
            secs => DateTime::from_timestamp(secs, 0),
        }
    }
}

/// TOML-backed settings file. Every `set` rewrites the file.
pub struct FileSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open the settings file, starting empty when it does not exist yet
    pub fn load(path: PathBuf) -> Result<Self> {
        let settings = Self::new(path);
        if settings.path.exists() {
            let content = std::fs::read_to_string(&settings.path)?;
            let values: BTreeMap<String, String> = toml::from_str(&content)?;
            *settings.write_values()? = values;
        }
        Ok(settings)
    }

    fn read_values(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.values
            .read()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))
    }

    fn write_values(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.values
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.write_values()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        self.read_values()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.read_values().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.write_values()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_persist_across_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let settings = FileSettings::load(path.clone()).unwrap();
        settings.set(TOKEN_KEY, "abc123").unwrap();
        settings.set(USER_KEY, "someone").unwrap();

        let reloaded = FileSettings::load(path).unwrap();
        assert_eq!(reloaded.get(TOKEN_KEY), Some("abc123".to_string()));
        assert_eq!(reloaded.get(USER_KEY), Some("someone".to_string()));
        assert!(reloaded.is_authenticated());
    }

    #[test]
    fn test_placeholder_tokens_are_not_authenticated() {
        let dir = tempdir().unwrap();
        let settings = FileSettings::new(dir.path().join("settings.toml"));
        assert!(!settings.is_authenticated());

        for placeholder in ["", "0", "empty_setting"] {
            settings.set(TOKEN_KEY, placeholder).unwrap();
            assert!(!settings.is_authenticated(), "token {:?} should not count", placeholder);
        }
    }

    #[test]
    fn test_next_daily_clear_defaults_to_zero() {
        let dir = tempdir().unwrap();
        let settings = FileSettings::new(dir.path().join("settings.toml"));
        assert_eq!(settings.next_daily_clear(), 0);
        assert_eq!(settings.next_daily_clear_at(), None);

        settings.set(NEXT_DAILY_CLEAR_KEY, "not a number").unwrap();
        assert_eq!(settings.next_daily_clear(), 0);

        settings.set_next_daily_clear(1_700_000_000).unwrap();
        assert_eq!(settings.next_daily_clear(), 1_700_000_000);
        assert_eq!(settings.get(NEXT_DAILY_CLEAR_KEY), Some("1700000000".to_string()));
        assert!(settings.next_daily_clear_at().is_some());
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = FileSettings::new(path.clone());
        settings.set("key1", "value1").unwrap();
        settings.set("key2", "value2").unwrap();

        settings.remove("key1").unwrap();
        settings.remove("missing").unwrap();

        let reloaded = FileSettings::load(path).unwrap();
        assert_eq!(reloaded.get("key1"), None);
        assert_eq!(reloaded.keys(), vec!["key2".to_string()]);
    }
}
