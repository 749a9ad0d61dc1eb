use serde::{Deserialize, Serialize};
use crate::media::MediaKind;

/// One watched item in the local watched index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedRow {
    pub kind: MediaKind,
    pub media_id: u64, // TMDB id
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub watched_at: String,
    pub title: String,
}

/// One partially watched item in the local progress index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressRow {
    pub kind: MediaKind,
    pub media_id: u64, // TMDB id
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Percent complete, rounded to one decimal
    pub percent: f64,
    /// Server-side playback id, used to resume or clear the entry
    pub resume_id: u64,
    pub paused_at: String,
    pub title: String,
}
