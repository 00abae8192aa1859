//! Core domain types for the console.
//!
//! This module contains the fundamental types used throughout the
//! application, designed to encode invariants via the type system.

pub mod request;
pub mod username;

// Re-export commonly used types at the module level
pub use request::{MAX_USERNAMES, PostCount, RequestError, ScrapeRequest};
pub use username::Username;
