//! The pinned webhook contract, kept configuration-driven.
//!
//! The revision history of this system disagreed with itself about how the
//! credential travels (`X-API-KEY`, `Authorization: Bearer`, raw
//! `Authorization`) and about the body shape (one username per request vs.
//! an `accounts` batch). The defaults below pin one contract -
//! `X-API-KEY` + one username per request - and the alternatives stay
//! selectable through configuration for compatibility with an unknown
//! receiver.

use serde_json::{Value, json};

use crate::types::{PostCount, Username};

/// Header used by the default auth scheme.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// How the webhook credential is attached to a dispatch request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-API-KEY: <key>` (the default).
    #[default]
    XApiKey,
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// `Authorization: <key>`, no scheme prefix.
    RawAuthorization,
}

impl AuthScheme {
    /// Parses a configuration value (`x-api-key`, `bearer`, `raw`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "x-api-key" => Some(AuthScheme::XApiKey),
            "bearer" => Some(AuthScheme::Bearer),
            "raw" => Some(AuthScheme::RawAuthorization),
            _ => None,
        }
    }
}

/// Shape of the dispatch body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{"username": ..., "posts": ...}` - one request per username
    /// (the default).
    #[default]
    Single,
    /// `{"accounts": [...], "posts": ...}` - the whole run in one request.
    Batch,
}

impl PayloadShape {
    /// Parses a configuration value (`single`, `batch`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Some(PayloadShape::Single),
            "batch" => Some(PayloadShape::Batch),
            _ => None,
        }
    }
}

/// Builds the single-username body.
pub fn single_payload(username: &Username, posts: PostCount) -> Value {
    json!({ "username": username.as_str(), "posts": posts.get() })
}

/// Builds the batch body.
pub fn batch_payload(usernames: &[Username], posts: PostCount) -> Value {
    let accounts: Vec<&str> = usernames.iter().map(Username::as_str).collect();
    json!({ "accounts": accounts, "posts": posts.get() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn username(raw: &str) -> Username {
        Username::normalize(raw).unwrap()
    }

    #[test]
    fn auth_scheme_parsing() {
        assert_eq!(AuthScheme::parse("x-api-key"), Some(AuthScheme::XApiKey));
        assert_eq!(AuthScheme::parse("Bearer"), Some(AuthScheme::Bearer));
        assert_eq!(AuthScheme::parse(" raw "), Some(AuthScheme::RawAuthorization));
        assert_eq!(AuthScheme::parse("hmac"), None);
    }

    #[test]
    fn payload_shape_parsing() {
        assert_eq!(PayloadShape::parse("single"), Some(PayloadShape::Single));
        assert_eq!(PayloadShape::parse("BATCH"), Some(PayloadShape::Batch));
        assert_eq!(PayloadShape::parse("multi"), None);
    }

    #[test]
    fn single_payload_shape() {
        let payload = single_payload(&username("natgeo"), PostCount::new(10).unwrap());
        assert_eq!(payload, json!({"username": "natgeo", "posts": 10}));
    }

    #[test]
    fn batch_payload_shape() {
        let payload = batch_payload(
            &[username("natgeo"), username("nasa")],
            PostCount::new(3).unwrap(),
        );
        assert_eq!(payload, json!({"accounts": ["natgeo", "nasa"], "posts": 3}));
    }
}
