pub mod config;
pub mod paths;
pub mod settings;

pub use config::{ApiConfig, Config, SchedulerConfig, SyncConfig};
pub use paths::{PathManager, container_base_path};
pub use settings::{FileSettings, SettingsStore};
