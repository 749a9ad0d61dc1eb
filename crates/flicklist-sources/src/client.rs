use crate::error::TransportError;
use flicklist_config::ApiConfig;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest server-requested back-off we are willing to sleep through
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Create a reqwest Client with the request timeout applied to every call
pub fn create_flicklist_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("flicklist-sync/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Thin HTTP wrapper around the FlickList REST API.
///
/// Handles the bearer token, the 401/429 status handling and JSON decoding.
/// Read-only GETs are all the sync core needs.
#[derive(Clone)]
pub struct FlickListClient {
    client: Arc<Client>,
    base_url: String,
    client_id: String,
    access_token: Option<String>,
    max_rate_limit_retries: u32,
    default_retry_after: Duration,
}

impl FlickListClient {
    pub fn new(config: &ApiConfig, access_token: Option<String>) -> Self {
        Self {
            client: Arc::new(create_flicklist_client(Duration::from_secs(config.timeout_secs))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            access_token,
            max_rate_limit_retries: config.max_rate_limit_retries,
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON body.
    ///
    /// A 429 sleeps for the server's Retry-After and tries again, at most
    /// `max_rate_limit_retries` times. A 401 fails immediately.
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        with_auth: bool,
    ) -> Result<Value, TransportError> {
        let token = if with_auth {
            Some(self.access_token.as_deref().ok_or(TransportError::NotAuthenticated)?)
        } else {
            None
        };

        let url = self.url(path);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let mut request = self
                .client
                .get(&url)
                .query(params)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .header("X-Client-Id", &self.client_id);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(|source| TransportError::Network {
                path: path.to_string(),
                source,
            })?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.max_rate_limit_retries {
                    return Err(TransportError::RateLimited {
                        path: path.to_string(),
                        attempts,
                    });
                }
                let header = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok());
                let delay = retry_after_delay(header, self.default_retry_after);
                warn!(
                    "FlickList rate limited {} (attempt {}), retrying in {:?}",
                    path, attempts, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                warn!("FlickList rejected the access token for {}; it may have expired", path);
                return Err(TransportError::Unauthorized { path: path.to_string() });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await.map_err(|source| TransportError::Network {
                path: path.to_string(),
                source,
            })?;
            debug!("GET {} -> {} ({} bytes)", path, status, body.len());
            return decode_body(path, &body);
        }
    }
}

/// Delay requested by a Retry-After header (delta-seconds form only)
pub(crate) fn retry_after_delay(header: Option<&str>, default: Duration) -> Duration {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
        .min(MAX_RETRY_AFTER)
}

pub(crate) fn decode_body(path: &str, body: &str) -> Result<Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| TransportError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn http_response(status_line: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            extra_headers,
            body.len(),
            body
        )
    }

    /// Answer one connection per canned response, in order, counting requests
    async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn client_for(base_url: String) -> FlickListClient {
        let mut config = ApiConfig::default();
        config.base_url = base_url;
        config.timeout_secs = 5;
        config.max_rate_limit_retries = 1;
        config.default_retry_after_secs = 0;
        FlickListClient::new(&config, Some("token".to_string()))
    }

    #[test]
    fn test_retry_after_delay() {
        let default = Duration::from_secs(5);
        assert_eq!(retry_after_delay(Some("3"), default), Duration::from_secs(3));
        assert_eq!(retry_after_delay(Some(" 12 "), default), Duration::from_secs(12));
        assert_eq!(retry_after_delay(None, default), default);
        assert_eq!(retry_after_delay(Some("Wed, 21 Oct 2015 07:28:00 GMT"), default), default);
        assert_eq!(retry_after_delay(Some("86400"), default), MAX_RETRY_AFTER);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body("/x", "").unwrap(), Value::Null);
        assert_eq!(decode_body("/x", "{\"all\": \"t\"}").unwrap()["all"], "t");
        let err = decode_body("/sync/last-activities", "<html>").unwrap_err();
        assert!(matches!(err, TransportError::Decode { ref path, .. } if path == "/sync/last-activities"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let mut config = ApiConfig::default();
        config.base_url = "http://localhost:9000/api/".to_string();
        let client = FlickListClient::new(&config, None);
        assert_eq!(client.url("/auth/me"), "http://localhost:9000/api/auth/me");
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token() {
        let client = FlickListClient::new(&ApiConfig::default(), None);
        let err = client.get("/sync/last-activities", &[], true).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_rate_limited_call_is_retried_once() {
        let (base_url, hits) = serve(vec![
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", ""),
            http_response("200 OK", "", "{\"all\": \"2024-01-01T00:00:00.000Z\"}"),
        ])
        .await;

        let value = client_for(base_url).get("/sync/last-activities", &[], true).await.unwrap();
        assert_eq!(value["all"], "2024-01-01T00:00:00.000Z");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_retry_cap() {
        let (base_url, hits) = serve(vec![
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", ""),
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", ""),
            http_response("200 OK", "", "{}"),
        ])
        .await;

        let err = client_for(base_url).get("/sync/last-activities", &[], true).await.unwrap_err();
        assert!(matches!(err, TransportError::RateLimited { attempts: 2, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let (base_url, hits) = serve(vec![
            http_response("401 Unauthorized", "", "{\"error\": \"invalid_token\"}"),
            http_response("200 OK", "", "{}"),
        ])
        .await;

        let err = client_for(base_url).get("/auth/me", &[], true).await.unwrap_err();
        assert!(matches!(err, TransportError::Unauthorized { ref path } if path == "/auth/me"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_a_failed_call() {
        let (base_url, hits) = serve(vec![http_response("503 Service Unavailable", "", "down")]).await;

        let err = client_for(base_url).get("/sync/playback", &[], true).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503, ref body, .. } if body == "down"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
