//! Username normalization.
//!
//! Operators paste handles in whatever form they have at hand: bare names,
//! `@`-prefixed mentions, or full profile URLs copied from a browser. All of
//! these normalize to the bare handle before dispatch, so the external
//! workflow only ever sees `cristiano`, never `  @cristiano ` or
//! `https://instagram.com/natgeo`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized social-media handle.
///
/// Construct via [`Username::normalize`]; the inner string is guaranteed
/// non-empty, free of surrounding whitespace, and free of leading `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Normalizes raw operator input into a handle.
    ///
    /// Applied in order:
    /// 1. surrounding whitespace is trimmed;
    /// 2. a profile URL (`https://instagram.com/natgeo`, with or without
    ///    scheme or `www.`) is unwrapped to its first path segment;
    /// 3. query strings and fragments are dropped;
    /// 4. leading `@` characters are stripped.
    ///
    /// Returns `None` if nothing usable remains.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();

        let handle = match profile_url_path(trimmed) {
            Some(path) => path
                .split(['?', '#'])
                .next()
                .unwrap_or("")
                .split('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(""),
            None => trimmed,
        };

        // Strip mention prefixes and whitespace to a fixed point, so inputs
        // like "@ @natgeo" cannot keep a leading marker.
        let mut handle = handle;
        loop {
            let stripped = handle.trim().trim_start_matches('@');
            if stripped == handle {
                break;
            }
            handle = stripped;
        }

        if handle.is_empty() {
            None
        } else {
            Some(Username(handle.to_string()))
        }
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracts the path portion of a profile URL.
///
/// Returns `None` when the input does not look like a URL, in which case the
/// caller treats the whole input as a handle. An input with an explicit
/// scheme but no path yields an empty path (and ultimately no username).
fn profile_url_path(input: &str) -> Option<&str> {
    let stripped = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"));
    let explicit_scheme = stripped.is_some();
    let rest = stripped.unwrap_or(input);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    match rest.split_once('/') {
        Some((host, path)) if explicit_scheme || host.contains('.') => Some(path),
        Some(_) => None,
        None if explicit_scheme => Some(""),
        None => None,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Whatever the operator pastes, a normalized handle never carries a
        /// leading `@` or surrounding whitespace, and is never empty.
        #[test]
        fn normalized_handles_are_clean(raw in ".*") {
            if let Some(u) = Username::normalize(&raw) {
                prop_assert!(!u.as_str().is_empty());
                prop_assert!(!u.as_str().starts_with('@'));
                prop_assert_eq!(u.as_str(), u.as_str().trim());
            }
        }

        /// Normalization is idempotent: a normalized handle normalizes to itself.
        #[test]
        fn normalization_is_idempotent(raw in "[a-zA-Z0-9._@ ]{0,40}") {
            if let Some(first) = Username::normalize(&raw) {
                let second = Username::normalize(first.as_str());
                prop_assert_eq!(second, Some(first));
            }
        }
    }
}
