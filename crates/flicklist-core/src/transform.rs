use flicklist_models::{MediaKind, ProgressRow, WatchedRow};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// TMDB ids arrive as numbers from most endpoints and as strings from a few
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RemoteId {
    Number(u64),
    Text(String),
}

impl RemoteId {
    fn value(&self) -> Option<u64> {
        match self {
            RemoteId::Number(0) => None,
            RemoteId::Number(n) => Some(*n),
            RemoteId::Text(s) => s.trim().parse().ok().filter(|n| *n > 0),
        }
    }
}

/// One `/scrobble/history` record
#[derive(Debug, Deserialize)]
struct HistoryEntry {
    tmdb_id: Option<RemoteId>,
    title: Option<String>,
    watched_at: Option<String>,
    created_at: Option<String>,
    season_number: Option<i64>,
    episode_number: Option<i64>,
}

/// One `/sync/playback` record
#[derive(Debug, Deserialize)]
struct PlaybackEntry {
    id: Option<u64>,
    media_type: Option<String>,
    progress: Option<f64>,
    updated_at: Option<String>,
    paused_at: Option<String>,
    tmdb_id: Option<RemoteId>,
    title: Option<String>,
    show_title: Option<String>,
    season_number: Option<i64>,
    season: Option<i64>,
    episode_number: Option<i64>,
    episode: Option<i64>,
}

impl PlaybackEntry {
    fn is_movie(&self) -> bool {
        self.media_type.as_deref().unwrap_or("movie") == "movie"
    }
}

fn decode<T: for<'de> Deserialize<'de>>(record: &Value) -> Option<T> {
    match T::deserialize(record) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!("Skipping malformed record: {}", e);
            None
        }
    }
}

fn positive_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

/// Watched history record → watched row, or `None` when it cannot be indexed
pub fn watched_row(kind: MediaKind, record: &Value) -> Option<WatchedRow> {
    let entry: HistoryEntry = decode(record)?;
    let media_id = entry.tmdb_id.as_ref().and_then(RemoteId::value)?;
    let watched_at = entry.watched_at.or(entry.created_at).unwrap_or_default();
    let title = entry.title.unwrap_or_default();

    match kind {
        MediaKind::Movie => Some(WatchedRow {
            kind,
            media_id,
            season: None,
            episode: None,
            watched_at,
            title,
        }),
        MediaKind::Episode => {
            let season = positive_u32(entry.season_number.unwrap_or(0))?;
            let episode = u32::try_from(entry.episode_number.unwrap_or(0)).unwrap_or(0);
            Some(WatchedRow {
                kind,
                media_id,
                season: Some(season),
                episode: Some(episode),
                watched_at,
                title,
            })
        }
    }
}

/// Playback record → progress row for `kind`, or `None` when the record is
/// another kind, barely started, or missing ids
pub fn progress_row(kind: MediaKind, record: &Value) -> Option<ProgressRow> {
    let entry: PlaybackEntry = decode(record)?;
    let wanted = match kind {
        MediaKind::Movie => entry.is_movie(),
        MediaKind::Episode => !entry.is_movie(),
    };
    if !wanted {
        return None;
    }

    let progress = entry.progress.unwrap_or(0.0);
    if progress.is_nan() || progress <= 1.0 {
        return None;
    }
    let media_id = entry.tmdb_id.as_ref().and_then(RemoteId::value)?;
    let percent = (progress * 10.0).round() / 10.0;
    let paused_at = entry.updated_at.or(entry.paused_at).unwrap_or_default();
    let resume_id = entry.id.unwrap_or(0);

    match kind {
        MediaKind::Movie => Some(ProgressRow {
            kind,
            media_id,
            season: None,
            episode: None,
            percent,
            resume_id,
            paused_at,
            title: entry.title.unwrap_or_default(),
        }),
        MediaKind::Episode => {
            let season = positive_u32(entry.season_number.or(entry.season).unwrap_or(0))?;
            let episode = entry
                .episode_number
                .or(entry.episode)
                .and_then(|e| u32::try_from(e).ok())
                .unwrap_or(0);
            Some(ProgressRow {
                kind,
                media_id,
                season: Some(season),
                episode: Some(episode),
                percent,
                resume_id,
                paused_at,
                title: entry.title.or(entry.show_title).unwrap_or_default(),
            })
        }
    }
}

/// Run `transform` over every record on at most `workers` blocking tasks.
///
/// Returns once every task has finished, in input order. Records the
/// transform rejects are dropped; a chunk whose task panics is dropped whole.
pub async fn transform_records<T, F>(records: Vec<Value>, workers: usize, transform: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&Value) -> Option<T> + Send + Sync + 'static,
{
    if records.is_empty() {
        return Vec::new();
    }

    let total = records.len();
    let workers = workers.max(1);
    let chunk_size = total.div_ceil(workers);
    let transform = Arc::new(transform);

    let mut tasks = JoinSet::new();
    let mut records = records.into_iter();
    let mut index = 0usize;
    loop {
        let chunk: Vec<Value> = records.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        let transform = Arc::clone(&transform);
        let chunk_index = index;
        tasks.spawn_blocking(move || {
            let rows: Vec<T> = chunk.iter().filter_map(|record| transform(record)).collect();
            (chunk_index, rows)
        });
        index += 1;
    }

    let mut chunks = Vec::with_capacity(index);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => warn!("Record transform task failed: {}", e),
        }
    }
    chunks.sort_by_key(|(chunk_index, _)| *chunk_index);

    let rows: Vec<T> = chunks.into_iter().flat_map(|(_, rows)| rows).collect();
    if rows.len() < total {
        debug!("Transformed {} of {} records", rows.len(), total);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_watched_row() {
        let row = watched_row(
            MediaKind::Movie,
            &json!({"tmdb_id": 603, "title": "The Matrix", "watched_at": "2024-05-01T10:00:00.000Z"}),
        )
        .unwrap();
        assert_eq!(row.media_id, 603);
        assert_eq!(row.season, None);
        assert_eq!(row.watched_at, "2024-05-01T10:00:00.000Z");

        let row = watched_row(MediaKind::Movie, &json!({"tmdb_id": "604", "created_at": "2024-05-02T10:00:00Z"})).unwrap();
        assert_eq!(row.media_id, 604);
        assert_eq!(row.watched_at, "2024-05-02T10:00:00Z");
        assert_eq!(row.title, "");
    }

    #[test]
    fn test_watched_row_requires_tmdb_id() {
        assert!(watched_row(MediaKind::Movie, &json!({"title": "No ids"})).is_none());
        assert!(watched_row(MediaKind::Movie, &json!({"tmdb_id": 0})).is_none());
        assert!(watched_row(MediaKind::Movie, &json!({"tmdb_id": null})).is_none());
        assert!(watched_row(MediaKind::Movie, &json!("not an object")).is_none());
    }

    #[test]
    fn test_episode_watched_row_requires_positive_season() {
        let row = watched_row(
            MediaKind::Episode,
            &json!({"tmdb_id": 1399, "season_number": 2, "episode_number": 5, "title": "GoT"}),
        )
        .unwrap();
        assert_eq!((row.season, row.episode), (Some(2), Some(5)));

        assert!(watched_row(MediaKind::Episode, &json!({"tmdb_id": 1399, "season_number": 0, "episode_number": 1})).is_none());
        assert!(watched_row(MediaKind::Episode, &json!({"tmdb_id": 1399})).is_none());
        assert!(watched_row(MediaKind::Episode, &json!({"tmdb_id": 1399, "season_number": "two"})).is_none());
    }

    #[test]
    fn test_movie_progress_row() {
        let record = json!({
            "id": 88, "media_type": "movie", "progress": 45.67, "tmdb_id": 550,
            "title": "Fight Club", "updated_at": "2024-04-04T04:04:04.000Z", "paused_at": "ignored"
        });
        let row = progress_row(MediaKind::Movie, &record).unwrap();
        assert_eq!(row.percent, 45.7);
        assert_eq!(row.resume_id, 88);
        assert_eq!(row.paused_at, "2024-04-04T04:04:04.000Z");
        assert!(progress_row(MediaKind::Episode, &record).is_none());
    }

    #[test]
    fn test_progress_row_thresholds() {
        assert!(progress_row(MediaKind::Movie, &json!({"media_type": "movie", "progress": 1.0, "tmdb_id": 1})).is_none());
        assert!(progress_row(MediaKind::Movie, &json!({"progress": 12.0, "tmdb_id": 1})).is_some());
        assert!(progress_row(MediaKind::Movie, &json!({"progress": 12.0})).is_none());
    }

    #[test]
    fn test_episode_progress_row_fallback_fields() {
        let record = json!({
            "id": 5, "media_type": "episode", "progress": 20.04, "tmdb_id": 1396,
            "show_title": "Breaking Bad", "season": 3, "episode": 7, "paused_at": "2024-01-01T00:00:00.000Z"
        });
        let row = progress_row(MediaKind::Episode, &record).unwrap();
        assert_eq!((row.season, row.episode), (Some(3), Some(7)));
        assert_eq!(row.percent, 20.0);
        assert_eq!(row.title, "Breaking Bad");
        assert_eq!(row.paused_at, "2024-01-01T00:00:00.000Z");

        let specials = json!({"media_type": "tv", "progress": 50.0, "tmdb_id": 1396, "season_number": 0});
        assert!(progress_row(MediaKind::Episode, &specials).is_none());
    }

    #[tokio::test]
    async fn test_transform_records_keeps_order_and_drops_bad_records() {
        let records: Vec<Value> = (1..=25)
            .map(|i| if i % 5 == 0 { json!({"title": "no id"}) } else { json!({"tmdb_id": i}) })
            .collect();

        let rows = transform_records(records, 4, |r| watched_row(MediaKind::Movie, r)).await;
        let ids: Vec<u64> = rows.iter().map(|r| r.media_id).collect();
        let expected: Vec<u64> = (1..=25).filter(|i| i % 5 != 0).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_transform_records_edge_sizes() {
        let empty: Vec<WatchedRow> = transform_records(Vec::new(), 8, |r| watched_row(MediaKind::Movie, r)).await;
        assert!(empty.is_empty());

        let one = transform_records(vec![json!({"tmdb_id": 7})], 0, |r| watched_row(MediaKind::Movie, r)).await;
        assert_eq!(one.len(), 1);
    }
}
