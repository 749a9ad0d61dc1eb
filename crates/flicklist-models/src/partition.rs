use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::media::{ListKind, MediaKind};

pub const RECOMMENDATIONS: &str = "recommendations";
pub const FAVORITES: &str = "favorites";
pub const COLLECTION: &str = "collection";
pub const WATCHLIST: &str = "watchlist";
pub const HIDDEN: &str = "hidden";
pub const LISTS: &str = "lists";
pub const LIST_CONTENTS: &str = "list_contents";
pub const CALENDAR: &str = "calendar";

/// Identifies one slice of the local cache.
///
/// Rendered as `category.subtype`. The subtype may itself contain dots
/// (`list_contents.my_lists.1234`), the category never does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    category: String,
    subtype: String,
}

impl PartitionKey {
    pub fn new(category: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subtype: subtype.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn collection(kind: MediaKind) -> Self {
        Self::new(COLLECTION, kind.partition_subtype())
    }

    pub fn watchlist(kind: MediaKind) -> Self {
        Self::new(WATCHLIST, kind.partition_subtype())
    }

    pub fn recommendations(kind: MediaKind) -> Self {
        Self::new(RECOMMENDATIONS, kind.partition_subtype())
    }

    pub fn favorites(kind: MediaKind) -> Self {
        Self::new(FAVORITES, kind.partition_subtype())
    }

    pub fn hidden_dropped() -> Self {
        Self::new(HIDDEN, "dropped")
    }

    pub fn list_metadata(kind: ListKind) -> Self {
        Self::new(LISTS, kind.as_str())
    }

    /// Contents of a single list belonging to `kind`
    pub fn list_contents(kind: ListKind, list_id: &str) -> Self {
        Self::new(LIST_CONTENTS, format!("{}.{}", kind.as_str(), list_id))
    }

    /// Prefix covering the contents of every list belonging to `kind`
    pub fn list_contents_prefix(kind: ListKind) -> String {
        format!("{}.{}", LIST_CONTENTS, kind.as_str())
    }

    /// True when this key is `prefix` itself or lives under `prefix.`
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let rendered = self.to_string();
        rendered == prefix
            || (rendered.len() > prefix.len()
                && rendered.starts_with(prefix)
                && rendered.as_bytes()[prefix.len()] == b'.')
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.subtype)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePartitionKeyError(String);

impl fmt::Display for ParsePartitionKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid partition key '{}': expected 'category.subtype'", self.0)
    }
}

impl std::error::Error for ParsePartitionKeyError {}

impl FromStr for PartitionKey {
    type Err = ParsePartitionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((category, subtype)) if !category.is_empty() && !subtype.is_empty() => {
                Ok(Self::new(category, subtype))
            }
            _ => Err(ParsePartitionKeyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let key = PartitionKey::collection(MediaKind::Episode);
        assert_eq!(key.to_string(), "collection.tvshow");

        let parsed: PartitionKey = "list_contents.my_lists.42".parse().unwrap();
        assert_eq!(parsed.category(), "list_contents");
        assert_eq!(parsed.subtype(), "my_lists.42");
        assert_eq!(parsed, PartitionKey::list_contents(ListKind::MyLists, "42"));
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!("collection".parse::<PartitionKey>().is_err());
        assert!(".movie".parse::<PartitionKey>().is_err());
        assert!("collection.".parse::<PartitionKey>().is_err());
    }

    #[test]
    fn test_matches_prefix_respects_segment_boundaries() {
        let key = PartitionKey::list_contents(ListKind::MyLists, "7");
        assert!(key.matches_prefix("list_contents"));
        assert!(key.matches_prefix("list_contents.my_lists"));
        assert!(key.matches_prefix("list_contents.my_lists.7"));
        assert!(!key.matches_prefix("list_contents.my"));
        assert!(!key.matches_prefix("lists"));
        assert!(!PartitionKey::list_metadata(ListKind::MyLists).matches_prefix("list_contents"));
    }
}
