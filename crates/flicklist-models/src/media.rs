use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media tracked by the watched and progress indexes.
///
/// Show-level data is always tracked per episode, so there is no separate
/// show variant here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Episode,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
        }
    }

    /// Value of the `media_type` query parameter on FlickList endpoints
    pub fn api_media_type(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "tv",
        }
    }

    /// Subtype used in collection/watchlist partition keys
    pub fn partition_subtype(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "tvshow",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User list groups refreshed by the lists activity timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ListKind {
    MyLists,
    LikedLists,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::MyLists => "my_lists",
            ListKind::LikedLists => "liked_lists",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
