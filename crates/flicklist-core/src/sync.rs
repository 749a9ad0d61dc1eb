use crate::cache::{fetch_cached, CacheStore};
use crate::compare::is_newer;
use crate::dispatch::{DispatchSummary, RefreshDispatcher};
use crate::host::Host;
use crate::index::IndexStore;
use crate::plan::{plan_actions, SyncAction};
use anyhow::Result;
use chrono::Utc;
use flicklist_config::settings::{NEXT_DAILY_CLEAR_KEY, TOKEN_KEY, USER_KEY, WATCHED_INDICATORS_KEY};
use flicklist_config::{SettingsStore, SyncConfig};
use flicklist_models::{ActivitySnapshot, PartitionKey};
use flicklist_sources::FlickListApi;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Seconds between two daily cache sweeps
pub const DAILY_CLEAR_INTERVAL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    NoAccount,
    FetchFailed,
    NotNeeded,
    Success,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyncOutcome::NoAccount => "no account",
            SyncOutcome::FetchFailed => "failed",
            SyncOutcome::NotNeeded => "not needed",
            SyncOutcome::Success => "success",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub full_reset: bool,
    pub daily_cleared: bool,
    pub actions: Vec<SyncAction>,
    pub summary: DispatchSummary,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

fn serialize_duration_ms<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

impl SyncReport {
    fn new() -> Self {
        Self {
            outcome: SyncOutcome::NotNeeded,
            full_reset: false,
            daily_cleared: false,
            actions: Vec::new(),
            summary: DispatchSummary::default(),
            duration: Duration::ZERO,
        }
    }
}

/// Incremental activity sync against FlickList.
///
/// Compares the remote last-activity snapshot with the stored baseline and
/// refreshes only the cache partitions and indexes whose timestamp moved.
/// Passes must not overlap; callers serialize them.
pub struct ActivitySync {
    api: Arc<dyn FlickListApi>,
    cache: Arc<dyn CacheStore>,
    settings: Arc<dyn SettingsStore>,
    index: Arc<dyn IndexStore>,
    host: Arc<dyn Host>,
    dispatcher: RefreshDispatcher,
    partition_ttl: chrono::Duration,
}

impl ActivitySync {
    pub fn new(
        api: Arc<dyn FlickListApi>,
        cache: Arc<dyn CacheStore>,
        settings: Arc<dyn SettingsStore>,
        index: Arc<dyn IndexStore>,
        host: Arc<dyn Host>,
        config: &SyncConfig,
    ) -> Self {
        let dispatcher = RefreshDispatcher::new(
            Arc::clone(&api),
            Arc::clone(&cache),
            Arc::clone(&index),
            Arc::clone(&host),
            config.history_page_size,
            config.transform_workers,
        );
        Self {
            api,
            cache,
            settings,
            index,
            host,
            dispatcher,
            partition_ttl: chrono::Duration::hours(i64::from(config.partition_ttl_hours)),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.settings.is_authenticated()
    }

    pub fn get_activity_baseline(&self) -> Result<ActivitySnapshot> {
        self.cache.get_baseline()
    }

    pub fn invalidate(&self, key: &PartitionKey) -> Result<()> {
        self.cache.invalidate(key)
    }

    /// Cached payload for `key`, fetched and stored on a miss
    pub async fn cached<F, Fut>(&self, key: &PartitionKey, fetch: F) -> Result<Vec<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Value>>>,
    {
        fetch_cached(self.cache.as_ref(), key, self.partition_ttl, fetch).await
    }

    /// Run one reconciliation pass.
    ///
    /// Remote failures come back as an outcome; only local storage errors
    /// are returned as `Err`.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, force_full_reset: bool) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::new();

        self.validate_token().await?;

        if force_full_reset {
            self.cache.invalidate_all("forced full reset")?;
            report.full_reset = true;
        } else if self.daily_clear_due() {
            self.cache.invalidate_daily()?;
            let next = Utc::now().timestamp() + DAILY_CLEAR_INTERVAL_SECS;
            self.settings.set_next_daily_clear(next)?;
            debug!("Next daily cache sweep at {}", next);
            report.daily_cleared = true;
        }

        if !force_full_reset && !self.settings.is_authenticated() {
            info!("No FlickList account configured, skipping activity sync");
            return Ok(finish(report, SyncOutcome::NoAccount, started));
        }

        let latest = match self.api.last_activities().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to fetch FlickList activities: {}", e);
                if e.is_unauthorized() {
                    self.host.notify("FlickList authorization failed. Please re-authorize.");
                }
                return Ok(finish(report, SyncOutcome::FetchFailed, started));
            }
        };

        let baseline = self.cache.get_baseline()?;
        if !force_full_reset && !is_newer(&latest.all, &baseline.all) {
            debug!("Activity watermark unchanged ({}), nothing to sync", latest.all);
            return Ok(finish(report, SyncOutcome::NotNeeded, started));
        }

        let plan = plan_actions(&latest, &baseline);
        info!("Activity changed: {} action(s) to apply", plan.len());
        report.summary = self.dispatcher.execute(&plan).await?;
        report.actions = plan.actions;

        self.cache.set_baseline(&latest)?;
        Ok(finish(report, SyncOutcome::Success, started))
    }

    /// Check the stored token against `/auth/me`. Only local write failures
    /// are errors; a rejected token is logged and the pass continues.
    async fn validate_token(&self) -> Result<()> {
        if !self.settings.is_authenticated() {
            return Ok(());
        }
        match self.api.current_user().await {
            Ok(profile) => {
                if let Some(name) = profile.name() {
                    if self.settings.get(USER_KEY).as_deref() != Some(name) {
                        self.settings.set(USER_KEY, name)?;
                    }
                }
            }
            Err(e) => warn!("FlickList token check failed, continuing: {}", e),
        }
        Ok(())
    }

    fn daily_clear_due(&self) -> bool {
        self.settings.next_daily_clear() <= Utc::now().timestamp()
    }

    /// Forget the account and everything cached for it
    pub fn revoke(&self) -> Result<()> {
        self.settings.set(USER_KEY, "empty_setting")?;
        self.settings.set(TOKEN_KEY, "0")?;
        self.settings.set(NEXT_DAILY_CLEAR_KEY, "0")?;
        self.settings.set(WATCHED_INDICATORS_KEY, "0")?;
        self.cache.invalidate_all("authorization revoked")?;
        self.index.clear()?;
        self.host.notify("FlickList authorization revoked");
        Ok(())
    }
}

fn finish(mut report: SyncReport, outcome: SyncOutcome, started: Instant) -> SyncReport {
    report.outcome = outcome;
    report.duration = started.elapsed();
    info!(
        "Activity sync finished: {} ({} action(s), {:?})",
        outcome,
        report.actions.len(),
        report.duration
    );
    report
}
