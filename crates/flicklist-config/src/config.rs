use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How many times a 429 response is retried before the call fails
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    /// Delay used when a 429 response carries no usable Retry-After header
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,
    #[serde(default = "default_transform_workers")]
    pub transform_workers: usize,
    #[serde(default = "default_partition_ttl_hours")]
    pub partition_ttl_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cron expression with a leading seconds field
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_base_url() -> String {
    "https://beta.flicklist.tv/api".to_string()
}

fn default_client_id() -> String {
    "flicklist_kodi_addon".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_rate_limit_retries() -> u32 {
    1
}

fn default_retry_after_secs() -> u64 {
    5
}

fn default_history_page_size() -> u32 {
    5000
}

fn default_transform_workers() -> usize {
    8
}

fn default_partition_ttl_hours() -> u32 {
    24 * 7
}

fn default_schedule() -> String {
    "0 */30 * * * *".to_string() // Every 30 minutes
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: default_client_id(),
            timeout_secs: default_timeout_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            history_page_size: default_history_page_size(),
            transform_workers: default_transform_workers(),
            partition_ttl_hours: default_partition_ttl_hours(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            run_on_startup: default_true(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("api.base_url cannot be empty"));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("api.base_url must be an http(s) URL: {}", self.api.base_url));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow::anyhow!("api.timeout_secs must be greater than zero"));
        }
        if self.sync.transform_workers == 0 {
            return Err(anyhow::anyhow!("sync.transform_workers must be greater than zero"));
        }
        if self.sync.history_page_size == 0 {
            return Err(anyhow::anyhow!("sync.history_page_size must be greater than zero"));
        }
        if self.scheduler.schedule.trim().is_empty() {
            return Err(anyhow::anyhow!("scheduler.schedule cannot be empty"));
        }
        Ok(())
    }
}
