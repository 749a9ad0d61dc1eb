use color_eyre::eyre::eyre;
use color_eyre::Result;
use flicklist_config::{Config, FileSettings, PathManager, SettingsStore};
use flicklist_core::{ActivitySync, FileCacheStore, FileIndexStore, LogHost};
use flicklist_sources::FlickListClient;
use std::sync::Arc;

/// Everything a command needs to talk to the local stores and FlickList
pub struct SyncContext {
    pub paths: PathManager,
    pub config: Config,
    pub settings: Arc<FileSettings>,
    pub cache: Arc<FileCacheStore>,
    pub index: Arc<FileIndexStore>,
}

impl SyncContext {
    pub fn load() -> Result<Self> {
        Self::load_with(PathManager::default())
    }

    pub fn load_with(paths: PathManager) -> Result<Self> {
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let settings_file = paths.settings_file();
        let settings = FileSettings::load(settings_file.clone())
            .map_err(|e| eyre!("Failed to load settings from {}: {}", settings_file.display(), e))?;
        let cache = FileCacheStore::new(&paths.cache_dir())
            .map_err(|e| eyre!("Failed to open cache at {}: {}", paths.cache_dir().display(), e))?;
        let index = FileIndexStore::new(&paths.index_dir())
            .map_err(|e| eyre!("Failed to open index at {}: {}", paths.index_dir().display(), e))?;

        Ok(Self {
            paths,
            config,
            settings: Arc::new(settings),
            cache: Arc::new(cache),
            index: Arc::new(index),
        })
    }

    /// A sync engine bound to the token currently in settings
    pub fn activity_sync(&self) -> ActivitySync {
        let client = FlickListClient::new(&self.config.api, self.settings.token());
        ActivitySync::new(
            Arc::new(client),
            self.cache.clone(),
            self.settings.clone(),
            self.index.clone(),
            Arc::new(LogHost),
            &self.config.sync,
        )
    }
}
