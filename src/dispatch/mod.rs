//! Outbound dispatch to the external automation webhook.
//!
//! Dispatch fires the request that asks the external workflow to start
//! collecting data; it owns no retry policy and no state. The contract with
//! the webhook (credential header, body shape) is pinned by configuration -
//! see [`contract`].

pub mod batch;
pub mod client;
pub mod contract;

pub use batch::{DispatchReport, any_succeeded, run_batch};
pub use client::{Dispatch, DispatchClient, DispatchError};
pub use contract::{AuthScheme, PayloadShape};
