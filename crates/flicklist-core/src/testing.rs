//! In-memory FlickList stand-in shared by the core's tests.

use crate::host::Host;
use crate::index::IndexStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use flicklist_models::{ActivitySnapshot, MediaKind, ProgressRow, WatchedRow};
use flicklist_sources::{FlickListApi, PaginatedResult, TransportError, UserProfile};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeApi {
    /// `None` makes `/sync/last-activities` fail
    pub activities: Mutex<Option<ActivitySnapshot>>,
    /// Missing kinds make `/scrobble/history` fail
    pub history: Mutex<HashMap<MediaKind, Vec<Value>>>,
    /// Reported page count for history responses, 1 when unset
    pub history_pages: Mutex<u32>,
    /// `None` makes `/sync/playback` fail
    pub playback: Mutex<Option<Vec<Value>>>,
    pub reject_token: bool,
    calls: Mutex<Vec<String>>,
}

fn unavailable(path: &str) -> TransportError {
    TransportError::Status {
        path: path.to_string(),
        status: 503,
        body: "unavailable".to_string(),
    }
}

impl FakeApi {
    pub fn with_activities(snapshot: ActivitySnapshot) -> Self {
        let api = Self::default();
        *api.activities.lock().unwrap() = Some(snapshot);
        api
    }

    pub fn set_activities(&self, snapshot: Option<ActivitySnapshot>) {
        *self.activities.lock().unwrap() = snapshot;
    }

    pub fn set_history(&self, kind: MediaKind, records: Vec<Value>) {
        self.history.lock().unwrap().insert(kind, records);
    }

    pub fn set_history_pages(&self, pages: u32) {
        *self.history_pages.lock().unwrap() = pages;
    }

    pub fn set_playback(&self, records: Vec<Value>) {
        *self.playback.lock().unwrap() = Some(records);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == path).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl FlickListApi for FakeApi {
    async fn current_user(&self) -> Result<UserProfile, TransportError> {
        self.record("/auth/me");
        if self.reject_token {
            return Err(TransportError::Unauthorized {
                path: "/auth/me".to_string(),
            });
        }
        Ok(UserProfile {
            username: Some("tester".to_string()),
            display_name: None,
        })
    }

    async fn last_activities(&self) -> Result<ActivitySnapshot, TransportError> {
        self.record("/sync/last-activities");
        self.activities
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable("/sync/last-activities"))
    }

    async fn watched_history(&self, kind: MediaKind, _per_page: u32) -> Result<PaginatedResult, TransportError> {
        let call = format!("/scrobble/history?media_type={}", kind.api_media_type());
        self.record(&call);
        self.history
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .map(|items| PaginatedResult {
                items,
                total_pages: (*self.history_pages.lock().unwrap()).max(1),
            })
            .ok_or_else(|| unavailable(&call))
    }

    async fn playback_progress(&self) -> Result<PaginatedResult, TransportError> {
        self.record("/sync/playback");
        self.playback
            .lock()
            .unwrap()
            .clone()
            .map(|items| PaginatedResult { items, total_pages: 1 })
            .ok_or_else(|| unavailable("/sync/playback"))
    }
}

/// Host that remembers every call, for assertions
#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    cleared: Mutex<Vec<MediaKind>>,
    notifications: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cleared(&self) -> Vec<MediaKind> {
        self.cleared.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn notifications(&self) -> Vec<String> {
        self.notifications.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Host for RecordingHost {
    fn clear_watched_markers(&self, kind: MediaKind) {
        if let Ok(mut cleared) = self.cleared.lock() {
            cleared.push(kind);
        }
    }

    fn notify(&self, message: &str) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(message.to_string());
        }
    }
}

/// In-process index
#[derive(Default)]
pub(crate) struct MemoryIndexStore {
    watched: Mutex<HashMap<MediaKind, Vec<WatchedRow>>>,
    progress: Mutex<HashMap<MediaKind, Vec<ProgressRow>>>,
}

impl MemoryIndexStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("index lock poisoned")
}

impl IndexStore for MemoryIndexStore {
    fn replace_watched(&self, kind: MediaKind, rows: Vec<WatchedRow>) -> Result<()> {
        self.watched.lock().map_err(poisoned)?.insert(kind, rows);
        Ok(())
    }

    fn replace_progress(&self, kind: MediaKind, rows: Vec<ProgressRow>) -> Result<()> {
        self.progress.lock().map_err(poisoned)?.insert(kind, rows);
        Ok(())
    }

    fn watched(&self, kind: MediaKind) -> Result<Vec<WatchedRow>> {
        Ok(self.watched.lock().map_err(poisoned)?.get(&kind).cloned().unwrap_or_default())
    }

    fn progress(&self, kind: MediaKind) -> Result<Vec<ProgressRow>> {
        Ok(self.progress.lock().map_err(poisoned)?.get(&kind).cloned().unwrap_or_default())
    }

    fn clear(&self) -> Result<()> {
        self.watched.lock().map_err(poisoned)?.clear();
        self.progress.lock().map_err(poisoned)?.clear();
        Ok(())
    }
}
