use thiserror::Error;

/// Failure of a single FlickList call.
///
/// None of these are fatal to a sync pass: the reconciler turns them into a
/// `fetch_failed` outcome, the refresh steps into "no rows this pass".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not authenticated with FlickList")]
    NotAuthenticated,

    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} rejected the access token (401)")]
    Unauthorized { path: String },

    #[error("{path} still rate limited after {attempts} attempt(s)")]
    RateLimited { path: String, attempts: u32 },

    #[error("{path} returned {status}: {body}")]
    Status { path: String, status: u16, body: String },

    #[error("could not decode response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Unauthorized { .. } | TransportError::NotAuthenticated)
    }
}
