use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp used for any activity the server did not report.
pub const FALLBACK_TIMESTAMP: &str = "2020-01-01T00:00:01.000Z";

fn fallback_timestamp() -> String {
    FALLBACK_TIMESTAMP.to_string()
}

/// Accepts a missing or `null` timestamp and substitutes the fallback
fn timestamp_or_fallback<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(fallback_timestamp))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Last-change timestamps for one media category (movies, shows or episodes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaActivity {
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub collected_at: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub watchlisted_at: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub watched_at: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub paused_at: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub dropped_at: String,
}

impl Default for MediaActivity {
    fn default() -> Self {
        Self {
            collected_at: fallback_timestamp(),
            watchlisted_at: fallback_timestamp(),
            watched_at: fallback_timestamp(),
            paused_at: fallback_timestamp(),
            dropped_at: fallback_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListActivity {
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub updated_at: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub liked_at: String,
}

impl Default for ListActivity {
    fn default() -> Self {
        Self {
            updated_at: fallback_timestamp(),
            liked_at: fallback_timestamp(),
        }
    }
}

/// Server report of when each category last changed (`/sync/last-activities`).
///
/// Every field is always populated: anything the server omits (or sends as
/// `null`) reads as [`FALLBACK_TIMESTAMP`], so comparisons never deal with
/// missing values. `all` is the global watermark that moves whenever anything
/// else does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub all: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub movies: MediaActivity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shows: MediaActivity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub episodes: MediaActivity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lists: ListActivity,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub recommendations: String,
    #[serde(default = "fallback_timestamp", deserialize_with = "timestamp_or_fallback")]
    pub favorites: String,
}

impl Default for ActivitySnapshot {
    fn default() -> Self {
        Self {
            all: fallback_timestamp(),
            movies: MediaActivity::default(),
            shows: MediaActivity::default(),
            episodes: MediaActivity::default(),
            lists: ListActivity::default(),
            recommendations: fallback_timestamp(),
            favorites: fallback_timestamp(),
        }
    }
}

impl ActivitySnapshot {
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Flattened `category.kind` view, in display order
    pub fn entries(&self) -> Vec<(String, &str)> {
        let mut entries = vec![("all".to_string(), self.all.as_str())];
        for (category, activity) in [
            ("movies", &self.movies),
            ("shows", &self.shows),
            ("episodes", &self.episodes),
        ] {
            entries.push((format!("{}.collected_at", category), activity.collected_at.as_str()));
            entries.push((format!("{}.watchlisted_at", category), activity.watchlisted_at.as_str()));
            entries.push((format!("{}.watched_at", category), activity.watched_at.as_str()));
            entries.push((format!("{}.paused_at", category), activity.paused_at.as_str()));
            entries.push((format!("{}.dropped_at", category), activity.dropped_at.as_str()));
        }
        entries.push(("lists.updated_at".to_string(), self.lists.updated_at.as_str()));
        entries.push(("lists.liked_at".to_string(), self.lists.liked_at.as_str()));
        entries.push(("recommendations".to_string(), self.recommendations.as_str()));
        entries.push(("favorites".to_string(), self.favorites.as_str()));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_use_fallback() {
        let snapshot = ActivitySnapshot::from_value(json!({
            "all": "2024-06-01T00:00:00.000Z",
            "movies": { "watched_at": "2024-05-01T10:00:00.000Z" }
        }))
        .unwrap();

        assert_eq!(snapshot.all, "2024-06-01T00:00:00.000Z");
        assert_eq!(snapshot.movies.watched_at, "2024-05-01T10:00:00.000Z");
        assert_eq!(snapshot.movies.paused_at, FALLBACK_TIMESTAMP);
        assert_eq!(snapshot.shows, MediaActivity::default());
        assert_eq!(snapshot.lists.liked_at, FALLBACK_TIMESTAMP);
        assert_eq!(snapshot.recommendations, FALLBACK_TIMESTAMP);
    }

    #[test]
    fn test_null_values_use_fallback() {
        let snapshot = ActivitySnapshot::from_value(json!({
            "all": null,
            "episodes": null,
            "lists": { "updated_at": null, "liked_at": "2024-02-02T00:00:00.000Z" },
            "favorites": null
        }))
        .unwrap();

        assert_eq!(snapshot.all, FALLBACK_TIMESTAMP);
        assert_eq!(snapshot.episodes, MediaActivity::default());
        assert_eq!(snapshot.lists.updated_at, FALLBACK_TIMESTAMP);
        assert_eq!(snapshot.lists.liked_at, "2024-02-02T00:00:00.000Z");
        assert_eq!(snapshot.favorites, FALLBACK_TIMESTAMP);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let snapshot = ActivitySnapshot::from_value(json!({
            "all": "2024-06-01T00:00:00.000Z",
            "anime": { "watched_at": "2024-06-01T00:00:00.000Z" },
            "movies": { "rated_at": "2024-06-01T00:00:00.000Z" }
        }))
        .unwrap();

        assert_eq!(snapshot.movies, MediaActivity::default());
    }

    #[test]
    fn test_entries_cover_every_timestamp() {
        let snapshot = ActivitySnapshot::default();
        let entries = snapshot.entries();

        // all + 3 media categories * 5 kinds + 2 list kinds + recommendations + favorites
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[0].0, "all");
        assert!(entries.iter().any(|(name, _)| name == "episodes.paused_at"));
        assert!(entries.iter().all(|(_, ts)| *ts == FALLBACK_TIMESTAMP));
    }
}
