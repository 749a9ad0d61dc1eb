use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use flicklist_models::partition::{CALENDAR, HIDDEN, LIST_CONTENTS, RECOMMENDATIONS};
use flicklist_models::{ActivitySnapshot, PartitionKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Partitions swept once a day regardless of activity
pub const DAILY_PREFIXES: [&str; 4] = [RECOMMENDATIONS, HIDDEN, LIST_CONTENTS, CALENDAR];

/// Keyed store of cached list payloads plus the activity baseline.
///
/// Invalidation is set removal: dropping a key that is not there is not an
/// error.
pub trait CacheStore: Send + Sync {
    /// Cached payload, or `None` when absent or expired
    fn get(&self, key: &PartitionKey) -> Result<Option<Vec<Value>>>;

    fn put(&self, key: &PartitionKey, payload: &[Value], ttl: Duration) -> Result<()>;

    fn invalidate(&self, key: &PartitionKey) -> Result<()>;

    /// Drop every partition equal to `prefix` or below `prefix.`; returns how many went
    fn invalidate_prefix(&self, prefix: &str) -> Result<usize>;

    /// Drop every partition and reset the baseline
    fn invalidate_all(&self, reason: &str) -> Result<()>;

    /// Stored baseline, or the all-fallback snapshot when nothing is stored
    fn get_baseline(&self) -> Result<ActivitySnapshot>;

    /// Replace the baseline as a whole
    fn set_baseline(&self, snapshot: &ActivitySnapshot) -> Result<()>;

    /// Remove partitions whose expiry has passed
    fn purge_expired(&self) -> Result<usize>;

    fn partition_keys(&self) -> Result<Vec<PartitionKey>>;

    /// The once-a-day sweep: a fixed subset of partitions, baseline untouched
    fn invalidate_daily(&self) -> Result<usize> {
        let mut removed = 0;
        for prefix in DAILY_PREFIXES {
            removed += self.invalidate_prefix(prefix)?;
        }
        info!("Daily cache sweep removed {} partition(s)", removed);
        Ok(removed)
    }
}

/// Read-through helper: return the cached payload for `key`, or run `fetch`
/// and cache what it returns for `ttl`.
pub async fn fetch_cached<F, Fut>(
    store: &dyn CacheStore,
    key: &PartitionKey,
    ttl: Duration,
    fetch: F,
) -> Result<Vec<Value>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
{
    if let Some(payload) = store.get(key)? {
        return Ok(payload);
    }
    let payload = fetch().await?;
    store.put(key, &payload, ttl)?;
    Ok(payload)
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedPartition {
    payload: Vec<Value>,
    expires_at: DateTime<Utc>,
}

/// One JSON file per partition under `<cache>/partitions`, baseline in
/// `<cache>/activity.json`.
#[derive(Clone)]
pub struct FileCacheStore {
    partitions_dir: PathBuf,
    baseline_path: PathBuf,
}

impl FileCacheStore {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        let partitions_dir = cache_dir.join("partitions");
        std::fs::create_dir_all(&partitions_dir)?;
        Ok(Self {
            partitions_dir,
            baseline_path: cache_dir.join("activity.json"),
        })
    }

    fn partition_path(&self, key: &PartitionKey) -> PathBuf {
        self.partitions_dir.join(format!("{}.json", file_safe(&key.to_string())))
    }

    fn stored_partitions(&self) -> Result<Vec<(PartitionKey, PathBuf)>> {
        if !self.partitions_dir.exists() {
            return Ok(Vec::new());
        }
        let mut stored = Vec::new();
        for entry in std::fs::read_dir(&self.partitions_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<PartitionKey>().ok());
            match key {
                Some(key) => stored.push((key, path)),
                None => debug!("Ignoring unrecognised cache file {:?}", path),
            }
        }
        stored.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(stored)
    }

    fn read_partition(&self, key: &PartitionKey, path: &Path) -> Option<CachedPartition> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache partition {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<CachedPartition>(&content) {
            Ok(partition) => Some(partition),
            Err(e) => {
                warn!("Cache corruption detected for {}: {}. Deleting corrupted file.", key, e);
                remove_if_present(path);
                None
            }
        }
    }
}

/// Filesystem-safe rendering of a key; the same mapping is applied to prefixes
fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}

fn remove_if_present(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to delete cache file {:?}: {}", path, e);
            false
        }
    }
}

/// Write to a temp file next to `path`, then rename over it
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &PartitionKey) -> Result<Option<Vec<Value>>> {
        let path = self.partition_path(key);
        if !path.exists() {
            debug!("Cache miss: {}", key);
            return Ok(None);
        }
        let Some(partition) = self.read_partition(key, &path) else {
            return Ok(None);
        };
        if partition.expires_at <= Utc::now() {
            debug!("Cache expired: {} (expired at {})", key, partition.expires_at);
            remove_if_present(&path);
            return Ok(None);
        }
        debug!("Cache hit: {} ({} records)", key, partition.payload.len());
        Ok(Some(partition.payload))
    }

    fn put(&self, key: &PartitionKey, payload: &[Value], ttl: Duration) -> Result<()> {
        let partition = CachedPartition {
            payload: payload.to_vec(),
            expires_at: Utc::now() + ttl,
        };
        let json = serde_json::to_string(&partition)
            .map_err(|e| anyhow!("Failed to serialize cache partition {}: {}", key, e))?;
        write_atomic(&self.partition_path(key), &json)?;
        debug!("Cache saved: {} ({} records)", key, payload.len());
        Ok(())
    }

    fn invalidate(&self, key: &PartitionKey) -> Result<()> {
        if remove_if_present(&self.partition_path(key)) {
            info!("Invalidated cache partition {}", key);
        }
        Ok(())
    }

    fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        let prefix = file_safe(prefix);
        let mut removed = 0;
        for (key, path) in self.stored_partitions()? {
            if key.matches_prefix(&prefix) && remove_if_present(&path) {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Invalidated {} cache partition(s) under {}", removed, prefix);
        }
        Ok(removed)
    }

    fn invalidate_all(&self, reason: &str) -> Result<()> {
        if self.partitions_dir.exists() {
            std::fs::remove_dir_all(&self.partitions_dir)?;
        }
        std::fs::create_dir_all(&self.partitions_dir)?;
        remove_if_present(&self.baseline_path);
        info!("Cleared all cache partitions and the activity baseline ({})", reason);
        Ok(())
    }

    fn get_baseline(&self) -> Result<ActivitySnapshot> {
        if !self.baseline_path.exists() {
            debug!("No activity baseline stored, using fallback snapshot");
            return Ok(ActivitySnapshot::default());
        }
        let content = std::fs::read_to_string(&self.baseline_path)?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!("Activity baseline is unreadable ({}), treating as empty", e);
                Ok(ActivitySnapshot::default())
            }
        }
    }

    fn set_baseline(&self, snapshot: &ActivitySnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.baseline_path, &json)?;
        debug!("Activity baseline saved (all = {})", snapshot.all);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for (key, path) in self.stored_partitions()? {
            // Corrupted files are removed inside read_partition
            if let Some(partition) = self.read_partition(&key, &path) {
                if partition.expires_at <= now && remove_if_present(&path) {
                    removed += 1;
                }
            }
        }
        info!("Purged {} expired cache partition(s)", removed);
        Ok(removed)
    }

    fn partition_keys(&self) -> Result<Vec<PartitionKey>> {
        Ok(self.stored_partitions()?.into_iter().map(|(key, _)| key).collect())
    }
}
