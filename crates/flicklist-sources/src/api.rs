use crate::client::FlickListClient;
use crate::error::TransportError;
use crate::paginated::PaginatedResult;
use async_trait::async_trait;
use flicklist_models::{ActivitySnapshot, MediaKind};
use serde::Deserialize;
use serde_json::Value;

/// The account behind the access token (`/auth/me`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    pub fn name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.display_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// The FlickList calls the sync core depends on.
///
/// All of them are idempotent GETs.
#[async_trait]
pub trait FlickListApi: Send + Sync {
    /// Check that the stored token is still accepted
    async fn current_user(&self) -> Result<UserProfile, TransportError>;

    /// Last-change timestamps per category
    async fn last_activities(&self) -> Result<ActivitySnapshot, TransportError>;

    /// Watched history for one media kind, fetched as a single large page
    async fn watched_history(&self, kind: MediaKind, per_page: u32) -> Result<PaginatedResult, TransportError>;

    /// Every in-progress playback entry, movies and episodes together
    async fn playback_progress(&self) -> Result<PaginatedResult, TransportError>;
}

fn expect_object(path: &str, value: Value) -> Result<Value, TransportError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(TransportError::Decode {
            path: path.to_string(),
            message: format!("expected a JSON object, got {}", value),
        })
    }
}

#[async_trait]
impl FlickListApi for FlickListClient {
    async fn current_user(&self) -> Result<UserProfile, TransportError> {
        let path = "/auth/me";
        let value = expect_object(path, self.get(path, &[], true).await?)?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn last_activities(&self) -> Result<ActivitySnapshot, TransportError> {
        let path = "/sync/last-activities";
        let value = expect_object(path, self.get(path, &[], true).await?)?;
        ActivitySnapshot::from_value(value).map_err(|e| TransportError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn watched_history(&self, kind: MediaKind, per_page: u32) -> Result<PaginatedResult, TransportError> {
        let params = [
            ("media_type", kind.api_media_type().to_string()),
            ("matched_only", "true".to_string()),
            ("per_page", per_page.to_string()),
        ];
        let value = self.get("/scrobble/history", &params, true).await?;
        Ok(PaginatedResult::from_value(value))
    }

    async fn playback_progress(&self) -> Result<PaginatedResult, TransportError> {
        let value = self.get("/sync/playback", &[], true).await?;
        Ok(PaginatedResult::from_value(value))
    }
}
