use crate::cache::CacheStore;
use crate::host::Host;
use crate::index::IndexStore;
use crate::plan::{ActionPlan, SyncAction};
use crate::transform::{progress_row, transform_records, watched_row};
use anyhow::Result;
use flicklist_models::partition::{FAVORITES, RECOMMENDATIONS};
use flicklist_models::{ListKind, MediaKind, PartitionKey};
use flicklist_sources::FlickListApi;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What executing a plan actually did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Rows written per rebuilt watched index
    pub watched: Vec<(MediaKind, usize)>,
    /// Rows written per rebuilt progress index
    pub progress: Vec<(MediaKind, usize)>,
    pub lists_refreshed: Vec<ListKind>,
    /// Remote pulls that failed and left their index as it was
    pub failed_fetches: usize,
}

/// Carries out the side effects of an [`ActionPlan`].
///
/// Remote failures degrade to "nothing replaced"; only local storage errors
/// are returned.
pub struct RefreshDispatcher {
    api: Arc<dyn FlickListApi>,
    cache: Arc<dyn CacheStore>,
    index: Arc<dyn IndexStore>,
    host: Arc<dyn Host>,
    history_page_size: u32,
    workers: usize,
}

impl RefreshDispatcher {
    pub fn new(
        api: Arc<dyn FlickListApi>,
        cache: Arc<dyn CacheStore>,
        index: Arc<dyn IndexStore>,
        host: Arc<dyn Host>,
        history_page_size: u32,
        workers: usize,
    ) -> Self {
        Self {
            api,
            cache,
            index,
            host,
            history_page_size,
            workers,
        }
    }

    pub async fn execute(&self, plan: &ActionPlan) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        let mut lists = Vec::new();

        for action in &plan.actions {
            debug!("Applying sync action: {}", action);
            match *action {
                SyncAction::InvalidateRecommendations => {
                    self.cache.invalidate_prefix(RECOMMENDATIONS)?;
                }
                SyncAction::InvalidateFavorites => {
                    self.cache.invalidate_prefix(FAVORITES)?;
                }
                SyncAction::InvalidateCollection(kind) => {
                    self.cache.invalidate(&PartitionKey::collection(kind))?;
                }
                SyncAction::InvalidateWatchlist(kind) => {
                    self.cache.invalidate(&PartitionKey::watchlist(kind))?;
                }
                SyncAction::ClearDropped => {
                    self.host.clear_watched_markers(MediaKind::Episode);
                    self.cache.invalidate(&PartitionKey::hidden_dropped())?;
                }
                SyncAction::RefreshWatched(kind) => {
                    self.host.clear_watched_markers(kind);
                    match self.refresh_watched(kind).await? {
                        Some(rows) => summary.watched.push((kind, rows)),
                        None => summary.failed_fetches += 1,
                    }
                }
                // Progress is fetched once for every flagged kind below
                SyncAction::RefreshProgress(_) => {}
                SyncAction::RefreshLists(kind) => lists.push(kind),
            }
        }

        let progress_kinds = plan.progress_kinds();
        if !progress_kinds.is_empty() {
            match self.refresh_progress(&progress_kinds).await? {
                Some(counts) => summary.progress = counts,
                None => summary.failed_fetches += 1,
            }
        }

        for kind in lists {
            self.refresh_lists(kind)?;
            summary.lists_refreshed.push(kind);
        }

        Ok(summary)
    }

    /// Pull the full watched history for `kind` and replace its index.
    /// `None` when the pull failed and the index was left alone.
    async fn refresh_watched(&self, kind: MediaKind) -> Result<Option<usize>> {
        let page = match self.api.watched_history(kind, self.history_page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {} watched history, keeping current index: {}", kind, e);
                return Ok(None);
            }
        };

        if page.total_pages > 1 {
            warn!(
                "{} watched history spans {} pages; only the first {} records are indexed",
                kind,
                page.total_pages,
                page.len()
            );
        }
        let fetched = page.len();
        let rows = transform_records(page.items, self.workers, move |record| watched_row(kind, record)).await;
        let written = rows.len();
        self.index.replace_watched(kind, rows)?;
        info!("Rebuilt {} watched index: {} of {} records", kind, written, fetched);
        Ok(Some(written))
    }

    async fn refresh_progress(&self, kinds: &[MediaKind]) -> Result<Option<Vec<(MediaKind, usize)>>> {
        let page = match self.api.playback_progress().await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch playback progress, keeping current index: {}", e);
                return Ok(None);
            }
        };

        let mut counts = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            self.host.clear_watched_markers(kind);
            let rows = transform_records(page.items.clone(), self.workers, move |record| {
                progress_row(kind, record)
            })
            .await;
            let written = rows.len();
            self.index.replace_progress(kind, rows)?;
            info!("Rebuilt {} progress index: {} rows", kind, written);
            counts.push((kind, written));
        }
        Ok(Some(counts))
    }

    fn refresh_lists(&self, kind: ListKind) -> Result<()> {
        self.cache.invalidate(&PartitionKey::list_metadata(kind))?;
        self.cache
            .invalidate_prefix(&PartitionKey::list_contents_prefix(kind))?;
        info!("Dropped cached {} metadata and contents", kind.as_str());
        Ok(())
    }
}
