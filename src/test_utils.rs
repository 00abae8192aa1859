//! Shared test fixtures: scripted stand-ins for the remote collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::dispatch::{Dispatch, DispatchError};
use crate::sheet::{RowSource, SheetError, SheetSnapshot};
use crate::types::{PostCount, Username};

/// Builds a snapshot with a standard header and `count` data rows.
pub(crate) fn rows(count: usize) -> SheetSnapshot {
    let headers = vec!["username".to_string(), "caption".to_string()];
    let rows = (0..count)
        .map(|i| vec![format!("user{i}"), format!("caption {i}")])
        .collect();
    SheetSnapshot::new(headers, rows)
}

/// A [`RowSource`] that replays a script of responses, then a fallback.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<SheetSnapshot, SheetError>>>,
    fallback: Result<SheetSnapshot, SheetError>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Replays `steps` in order; once exhausted, returns an empty snapshot.
    pub fn script(steps: Vec<Result<SheetSnapshot, SheetError>>) -> Self {
        ScriptedSource {
            script: Mutex::new(steps.into()),
            fallback: Ok(SheetSnapshot::empty()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the same snapshot on every call.
    pub fn always(snapshot: SheetSnapshot) -> Self {
        ScriptedSource {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call with a transport error.
    pub fn always_failing(message: &str) -> Self {
        ScriptedSource {
            script: Mutex::new(VecDeque::new()),
            fallback: Err(SheetError::Transport(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of remote reads performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowSource for ScriptedSource {
    async fn fetch_rows(&self) -> Result<SheetSnapshot, SheetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// A [`Dispatch`] that records every handle it sees and replays a script of
/// results, then succeeds.
pub(crate) struct ScriptedDispatch {
    script: Mutex<VecDeque<Result<(), DispatchError>>>,
    seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedDispatch {
    /// Accepts every dispatch.
    pub fn all_ok() -> Self {
        Self::script(Vec::new())
    }

    /// Replays `steps` in order; once exhausted, accepts.
    pub fn script(steps: Vec<Result<(), DispatchError>>) -> Self {
        ScriptedDispatch {
            script: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every handle passed to `send`, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of requests made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatch for ScriptedDispatch {
    async fn send(&self, usernames: &[Username], _posts: PostCount) -> Result<(), DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .extend(usernames.iter().map(|u| u.as_str().to_string()));
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
