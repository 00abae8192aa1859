//! HTTP client for the automation webhook.
//!
//! One POST per [`DispatchClient::send`] call, JSON body, credential header
//! per the configured [`AuthScheme`], fixed request timeout. Success is HTTP
//! 200 exactly; everything else - other statuses, timeouts, transport
//! failures - maps to a [`DispatchError`] carrying a human-readable message.
//! This client never retries; recovery is the operator submitting again.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::{PostCount, Username};

use super::contract::{API_KEY_HEADER, AuthScheme, PayloadShape, batch_payload, single_payload};

/// Longest response body kept in a status error.
const MAX_ERROR_BODY: usize = 300;

/// Errors from a single dispatch request.
///
/// A rejected status and a timeout are deliberately distinct variants with
/// distinct messages: a 403 body must never read like a timeout.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The webhook answered with a non-200 status.
    #[error("webhook rejected the request (HTTP {code}): {body}")]
    Status { code: u16, body: String },

    /// The request ran out of time.
    #[error("webhook request timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    /// The request never completed (DNS, connect, TLS).
    #[error("webhook request failed: {0}")]
    Transport(String),
}

/// The dispatch seam: one outbound request asking the external workflow to
/// start collecting data for the given usernames.
///
/// Under the single-username contract, callers pass exactly one username per
/// call; the batch contract takes the whole run at once.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn send(&self, usernames: &[Username], posts: PostCount) -> Result<(), DispatchError>;
}

/// A [`Dispatch`] implementation backed by the real webhook.
pub struct DispatchClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    auth: AuthScheme,
    shape: PayloadShape,
    /// Mirrors the timeout configured on `http`, kept for error messages.
    timeout: Duration,
}

impl DispatchClient {
    /// Creates a client for one webhook endpoint.
    ///
    /// `http` must already carry the request timeout; `timeout` is the same
    /// value, repeated here so timeout errors can report it.
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        auth: AuthScheme,
        shape: PayloadShape,
        timeout: Duration,
    ) -> Self {
        DispatchClient {
            http,
            url: url.into(),
            api_key: api_key.into(),
            auth,
            shape,
            timeout,
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            AuthScheme::XApiKey => request.header(API_KEY_HEADER, self.api_key.as_str()),
            AuthScheme::Bearer => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            ),
            AuthScheme::RawAuthorization => {
                request.header(header::AUTHORIZATION, self.api_key.as_str())
            }
        }
    }

    fn payload_for(
        &self,
        usernames: &[Username],
        posts: PostCount,
    ) -> Result<serde_json::Value, DispatchError> {
        match self.shape {
            PayloadShape::Single => match usernames {
                [username] => Ok(single_payload(username, posts)),
                _ => Err(DispatchError::Transport(format!(
                    "single-username contract got {} usernames",
                    usernames.len()
                ))),
            },
            PayloadShape::Batch => Ok(batch_payload(usernames, posts)),
        }
    }
}

impl std::fmt::Debug for DispatchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchClient")
            .field("url", &self.url)
            .field("auth", &self.auth)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Dispatch for DispatchClient {
    async fn send(&self, usernames: &[Username], posts: PostCount) -> Result<(), DispatchError> {
        let payload = self.payload_for(usernames, posts)?;

        let response = self
            .apply_auth(self.http.post(&self.url).json(&payload))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout {
                        timeout: self.timeout,
                    }
                } else {
                    DispatchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            info!(count = usernames.len(), posts = %posts, "dispatch accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(code = status.as_u16(), "dispatch rejected");
        Err(DispatchError::Status {
            code: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut cut = MAX_ERROR_BODY;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(auth: AuthScheme, shape: PayloadShape) -> DispatchClient {
        DispatchClient::new(
            reqwest::Client::new(),
            "https://hooks.example/run",
            "top-secret",
            auth,
            shape,
            Duration::from_secs(60),
        )
    }

    fn username(raw: &str) -> Username {
        Username::normalize(raw).unwrap()
    }

    #[test]
    fn x_api_key_header_is_applied() {
        let c = client(AuthScheme::XApiKey, PayloadShape::Single);
        let request = c
            .apply_auth(c.http.post(&c.url))
            .build()
            .unwrap();
        assert_eq!(request.headers()["X-API-KEY"], "top-secret");
    }

    #[test]
    fn bearer_header_is_applied() {
        let c = client(AuthScheme::Bearer, PayloadShape::Single);
        let request = c.apply_auth(c.http.post(&c.url)).build().unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer top-secret");
    }

    #[test]
    fn raw_authorization_header_is_applied() {
        let c = client(AuthScheme::RawAuthorization, PayloadShape::Single);
        let request = c.apply_auth(c.http.post(&c.url)).build().unwrap();
        assert_eq!(request.headers()["authorization"], "top-secret");
    }

    #[test]
    fn single_contract_takes_exactly_one_username() {
        let c = client(AuthScheme::XApiKey, PayloadShape::Single);
        let posts = PostCount::new(5).unwrap();

        assert!(c.payload_for(&[username("natgeo")], posts).is_ok());
        assert!(
            c.payload_for(&[username("natgeo"), username("nasa")], posts)
                .is_err()
        );
    }

    #[test]
    fn batch_contract_takes_the_whole_run() {
        let c = client(AuthScheme::XApiKey, PayloadShape::Batch);
        let posts = PostCount::new(5).unwrap();

        let payload = c
            .payload_for(&[username("natgeo"), username("nasa")], posts)
            .unwrap();
        assert_eq!(payload["accounts"].as_array().unwrap().len(), 2);
    }

    /// A 403 result must carry the body text and must not read like a
    /// timeout.
    #[test]
    fn status_and_timeout_errors_are_distinguishable() {
        let status = DispatchError::Status {
            code: 403,
            body: "forbidden: bad key".to_string(),
        };
        let timeout = DispatchError::Timeout {
            timeout: Duration::from_secs(60),
        };

        let status_msg = status.to_string();
        let timeout_msg = timeout.to_string();

        assert!(status_msg.contains("403"));
        assert!(status_msg.contains("forbidden: bad key"));
        assert!(!status_msg.contains("timed out"));
        assert!(timeout_msg.contains("timed out after 60s"));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "e".repeat(2000);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= MAX_ERROR_BODY + '…'.len_utf8());
    }
}
