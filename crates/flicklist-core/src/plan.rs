use crate::compare::is_newer;
use flicklist_models::{ActivitySnapshot, ListKind, MediaKind};
use serde::Serialize;
use std::fmt;

/// One side effect decided by comparing a fresh snapshot against the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "kind", rename_all = "snake_case")]
pub enum SyncAction {
    InvalidateRecommendations,
    InvalidateFavorites,
    InvalidateCollection(MediaKind),
    InvalidateWatchlist(MediaKind),
    /// Clear episode markers and drop the hidden/dropped partition
    ClearDropped,
    /// Clear markers and rebuild the watched index for one kind
    RefreshWatched(MediaKind),
    /// Rebuild the progress index for one kind
    RefreshProgress(MediaKind),
    /// Drop list metadata and contents for one list group
    RefreshLists(ListKind),
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::InvalidateRecommendations => write!(f, "invalidate recommendations"),
            SyncAction::InvalidateFavorites => write!(f, "invalidate favorites"),
            SyncAction::InvalidateCollection(kind) => write!(f, "invalidate {} collection", kind),
            SyncAction::InvalidateWatchlist(kind) => write!(f, "invalidate {} watchlist", kind),
            SyncAction::ClearDropped => write!(f, "clear dropped shows"),
            SyncAction::RefreshWatched(kind) => write!(f, "refresh {} watched", kind),
            SyncAction::RefreshProgress(kind) => write!(f, "refresh {} progress", kind),
            SyncAction::RefreshLists(kind) => write!(f, "refresh {}", kind.as_str()),
        }
    }
}

/// Ordered actions for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    pub actions: Vec<SyncAction>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn contains(&self, action: SyncAction) -> bool {
        self.actions.contains(&action)
    }

    /// Media kinds whose progress index needs rebuilding
    pub fn progress_kinds(&self) -> Vec<MediaKind> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                SyncAction::RefreshProgress(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

/// Compare every leaf timestamp of `latest` against `cached`.
///
/// Each comparison stands on its own; nothing here looks at `all`.
pub fn plan_actions(latest: &ActivitySnapshot, cached: &ActivitySnapshot) -> ActionPlan {
    let checks = [
        (
            is_newer(&latest.recommendations, &cached.recommendations),
            SyncAction::InvalidateRecommendations,
        ),
        (
            is_newer(&latest.favorites, &cached.favorites),
            SyncAction::InvalidateFavorites,
        ),
        (
            is_newer(&latest.movies.collected_at, &cached.movies.collected_at),
            SyncAction::InvalidateCollection(MediaKind::Movie),
        ),
        (
            is_newer(&latest.episodes.collected_at, &cached.episodes.collected_at),
            SyncAction::InvalidateCollection(MediaKind::Episode),
        ),
        (
            is_newer(&latest.movies.watchlisted_at, &cached.movies.watchlisted_at),
            SyncAction::InvalidateWatchlist(MediaKind::Movie),
        ),
        (
            is_newer(&latest.shows.watchlisted_at, &cached.shows.watchlisted_at),
            SyncAction::InvalidateWatchlist(MediaKind::Episode),
        ),
        (
            is_newer(&latest.shows.dropped_at, &cached.shows.dropped_at),
            SyncAction::ClearDropped,
        ),
        (
            is_newer(&latest.movies.watched_at, &cached.movies.watched_at),
            SyncAction::RefreshWatched(MediaKind::Movie),
        ),
        (
            is_newer(&latest.episodes.watched_at, &cached.episodes.watched_at),
            SyncAction::RefreshWatched(MediaKind::Episode),
        ),
        (
            is_newer(&latest.movies.paused_at, &cached.movies.paused_at),
            SyncAction::RefreshProgress(MediaKind::Movie),
        ),
        (
            is_newer(&latest.episodes.paused_at, &cached.episodes.paused_at),
            SyncAction::RefreshProgress(MediaKind::Episode),
        ),
        (
            is_newer(&latest.lists.updated_at, &cached.lists.updated_at),
            SyncAction::RefreshLists(ListKind::MyLists),
        ),
        (
            is_newer(&latest.lists.liked_at, &cached.lists.liked_at),
            SyncAction::RefreshLists(ListKind::LikedLists),
        ),
    ];

    ActionPlan {
        actions: checks
            .into_iter()
            .filter_map(|(changed, action)| changed.then_some(action))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "2024-01-01T00:00:00.000Z";
    const NEW: &str = "2024-06-01T00:00:00.000Z";

    fn snapshot_at(ts: &str) -> ActivitySnapshot {
        let mut snapshot = ActivitySnapshot::default();
        snapshot.all = ts.to_string();
        snapshot.recommendations = ts.to_string();
        snapshot.favorites = ts.to_string();
        for media in [&mut snapshot.movies, &mut snapshot.shows, &mut snapshot.episodes] {
            media.collected_at = ts.to_string();
            media.watchlisted_at = ts.to_string();
            media.watched_at = ts.to_string();
            media.paused_at = ts.to_string();
            media.dropped_at = ts.to_string();
        }
        snapshot.lists.updated_at = ts.to_string();
        snapshot.lists.liked_at = ts.to_string();
        snapshot
    }

    #[test]
    fn test_identical_snapshots_plan_nothing() {
        let plan = plan_actions(&snapshot_at(OLD), &snapshot_at(OLD));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_top_level_change_alone_plans_nothing() {
        let cached = snapshot_at(OLD);
        let mut latest = snapshot_at(OLD);
        latest.all = NEW.to_string();
        assert!(plan_actions(&latest, &cached).is_empty());
    }

    #[test]
    fn test_only_movie_watched() {
        let cached = snapshot_at(OLD);
        let mut latest = snapshot_at(OLD);
        latest.all = NEW.to_string();
        latest.movies.watched_at = NEW.to_string();

        let plan = plan_actions(&latest, &cached);
        assert_eq!(plan.actions, vec![SyncAction::RefreshWatched(MediaKind::Movie)]);
        assert!(plan.progress_kinds().is_empty());
    }

    #[test]
    fn test_everything_changed_keeps_order() {
        let plan = plan_actions(&snapshot_at(NEW), &snapshot_at(OLD));
        assert_eq!(
            plan.actions,
            vec![
                SyncAction::InvalidateRecommendations,
                SyncAction::InvalidateFavorites,
                SyncAction::InvalidateCollection(MediaKind::Movie),
                SyncAction::InvalidateCollection(MediaKind::Episode),
                SyncAction::InvalidateWatchlist(MediaKind::Movie),
                SyncAction::InvalidateWatchlist(MediaKind::Episode),
                SyncAction::ClearDropped,
                SyncAction::RefreshWatched(MediaKind::Movie),
                SyncAction::RefreshWatched(MediaKind::Episode),
                SyncAction::RefreshProgress(MediaKind::Movie),
                SyncAction::RefreshProgress(MediaKind::Episode),
                SyncAction::RefreshLists(ListKind::MyLists),
                SyncAction::RefreshLists(ListKind::LikedLists),
            ]
        );
        assert_eq!(plan.progress_kinds(), vec![MediaKind::Movie, MediaKind::Episode]);
    }

    #[test]
    fn test_fields_that_drive_nothing_are_ignored() {
        let cached = snapshot_at(OLD);
        let mut latest = snapshot_at(OLD);
        // shows.collected_at and episodes.watchlisted_at have no action of their own
        latest.shows.collected_at = NEW.to_string();
        latest.episodes.watchlisted_at = NEW.to_string();
        latest.movies.dropped_at = NEW.to_string();
        assert!(plan_actions(&latest, &cached).is_empty());
    }

    #[test]
    fn test_malformed_leaf_counts_as_changed() {
        let cached = snapshot_at(OLD);
        let mut latest = snapshot_at(OLD);
        latest.lists.liked_at = "yesterday".to_string();
        assert_eq!(
            plan_actions(&latest, &cached).actions,
            vec![SyncAction::RefreshLists(ListKind::LikedLists)]
        );
    }

    #[test]
    fn test_older_remote_timestamp_is_not_a_change() {
        let plan = plan_actions(&snapshot_at(OLD), &snapshot_at(NEW));
        assert!(plan.is_empty());
    }
}
