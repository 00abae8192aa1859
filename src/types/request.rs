//! Scrape request validation.
//!
//! A run is at most [`MAX_USERNAMES`] handles and a post count within
//! [`PostCount::MIN`]..=[`PostCount::MAX`]. Validation happens once, at the
//! form boundary; everything past this module works with an already-valid
//! request. Duplicate handles are kept as entered - the external workflow is
//! free to deduplicate, this system does not.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::username::Username;

/// Maximum number of usernames accepted per run.
pub const MAX_USERNAMES: usize = 5;

/// Errors produced when validating operator input into a [`ScrapeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No usable username remained after normalization.
    #[error("enter at least one username")]
    NoUsernames,

    /// More usernames than a single run accepts.
    #[error("at most 5 usernames per run (got {0})")]
    TooManyUsernames(usize),

    /// Post count outside the accepted range.
    #[error("post count must be between 1 and 10 (got {0})")]
    PostCountOutOfRange(u32),
}

/// Number of posts to collect per username, constrained to `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostCount(u32);

impl PostCount {
    /// Smallest accepted post count.
    pub const MIN: u32 = 1;
    /// Largest accepted post count.
    pub const MAX: u32 = 10;

    /// Validates a raw count into a `PostCount`.
    pub fn new(count: u32) -> Result<Self, RequestError> {
        if (Self::MIN..=Self::MAX).contains(&count) {
            Ok(PostCount(count))
        } else {
            Err(RequestError::PostCountOutOfRange(count))
        }
    }

    /// Returns the count as a plain integer.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PostCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated scrape run: an ordered list of handles plus a post count.
///
/// Ownership is per-submission: the request is built from one form post,
/// handed to the dispatch layer, and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    usernames: Vec<Username>,
    posts: PostCount,
}

impl ScrapeRequest {
    /// Parses raw form input into a request.
    ///
    /// `raw_usernames` is one handle per line; lines that normalize to
    /// nothing are dropped. Input order is preserved and duplicates are not
    /// removed.
    pub fn parse(raw_usernames: &str, posts: u32) -> Result<Self, RequestError> {
        let usernames: Vec<Username> = raw_usernames
            .lines()
            .filter_map(Username::normalize)
            .collect();

        if usernames.is_empty() {
            return Err(RequestError::NoUsernames);
        }
        if usernames.len() > MAX_USERNAMES {
            return Err(RequestError::TooManyUsernames(usernames.len()));
        }

        Ok(ScrapeRequest {
            usernames,
            posts: PostCount::new(posts)?,
        })
    }

    /// The handles to dispatch, in input order.
    pub fn usernames(&self) -> &[Username] {
        &self.usernames
    }

    /// The post count for every handle in this run.
    pub fn posts(&self) -> PostCount {
        self.posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_input_order() {
        let request = ScrapeRequest::parse("natgeo\n@cristiano\n nasa ", 3).unwrap();
        let handles: Vec<&str> = request.usernames().iter().map(Username::as_str).collect();
        assert_eq!(handles, vec!["natgeo", "cristiano", "nasa"]);
        assert_eq!(request.posts().get(), 3);
    }

    #[test]
    fn blank_lines_are_dropped_before_counting() {
        let request = ScrapeRequest::parse("\n natgeo \n\n@nasa\n", 1).unwrap();
        assert_eq!(request.usernames().len(), 2);
    }

    #[test]
    fn duplicates_are_preserved() {
        let request = ScrapeRequest::parse("natgeo\nnatgeo", 2).unwrap();
        assert_eq!(request.usernames().len(), 2);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            ScrapeRequest::parse("", 5),
            Err(RequestError::NoUsernames)
        );
        assert_eq!(
            ScrapeRequest::parse("  \n @ \n", 5),
            Err(RequestError::NoUsernames)
        );
    }

    #[test]
    fn more_than_five_usernames_is_rejected() {
        let raw = "a\nb\nc\nd\ne\nf";
        assert_eq!(
            ScrapeRequest::parse(raw, 5),
            Err(RequestError::TooManyUsernames(6))
        );
    }

    #[test]
    fn five_usernames_is_the_limit() {
        let raw = "a\nb\nc\nd\ne";
        assert!(ScrapeRequest::parse(raw, 5).is_ok());
    }

    #[test]
    fn post_count_bounds() {
        assert!(PostCount::new(1).is_ok());
        assert!(PostCount::new(10).is_ok());
        assert_eq!(
            PostCount::new(0),
            Err(RequestError::PostCountOutOfRange(0))
        );
        assert_eq!(
            PostCount::new(11),
            Err(RequestError::PostCountOutOfRange(11))
        );
    }

    #[test]
    fn out_of_range_posts_rejects_the_whole_request() {
        assert_eq!(
            ScrapeRequest::parse("natgeo", 0),
            Err(RequestError::PostCountOutOfRange(0))
        );
    }
}
