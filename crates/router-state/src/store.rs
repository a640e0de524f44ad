//! Router state store
//!
//! Holds only `{ path }`. Each of the four transitions compares the target
//! path with the current one: equal paths are a no-op (no state change, no
//! change record), anything else replaces the state and emits a
//! [`ChangeRecord`] with a sequence number that increases across all modes.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{broadcast, watch};

/// Capacity of the change record channel
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// How a transition was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// New history entry
    Push,
    /// Replace the current entry
    Replace,
    /// Replace the current entry on behalf of a guard
    Redirect,
    /// Host back/forward navigation
    Pop,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationMode::Push => "push",
            NavigationMode::Replace => "replace",
            NavigationMode::Redirect => "redirect",
            NavigationMode::Pop => "pop",
        };
        f.write_str(s)
    }
}

/// Router state snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouterState {
    /// Current path
    pub path: String,
}

impl RouterState {
    /// Create a state for a path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Record of one successful transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Transition kind
    pub mode: NavigationMode,
    /// State before the transition
    pub from_state: RouterState,
    /// State after the transition
    pub to_state: RouterState,
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    state: RouterState,
    sequence: u64,
    last_change: Option<ChangeRecord>,
}

/// Minimal reactive store for the current path
///
/// # Example
///
/// ```
/// use router_state::{NavigationMode, RouterStore};
///
/// let store = RouterStore::new();
/// let change = store.push("/a").unwrap();
/// assert_eq!(change.mode, NavigationMode::Push);
/// assert_eq!(change.sequence, 1);
///
/// // Same path again is a no-op
/// assert!(store.push("/a").is_none());
/// assert_eq!(store.sequence(), 1);
/// ```
pub struct RouterStore {
    inner: Mutex<StoreInner>,
    state_tx: watch::Sender<RouterState>,
    changes_tx: broadcast::Sender<ChangeRecord>,
}

impl RouterStore {
    /// Create a store with an empty path
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(RouterState::default());
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            inner: Mutex::new(StoreInner::default()),
            state_tx,
            changes_tx,
        }
    }

    /// Apply a transition
    ///
    /// Returns the emitted record, or `None` if `path` equals the current path.
    pub fn dispatch(&self, mode: NavigationMode, path: impl Into<String>) -> Option<ChangeRecord> {
        let path = path.into();
        let mut inner = self.inner.lock();

        if inner.state.path == path {
            tracing::trace!(%mode, %path, "navigation is a no-op");
            return None;
        }

        inner.sequence += 1;
        let record = ChangeRecord {
            mode,
            from_state: inner.state.clone(),
            to_state: RouterState::new(path),
            sequence: inner.sequence,
        };
        inner.state = record.to_state.clone();
        inner.last_change = Some(record.clone());

        tracing::debug!(
            %mode,
            from = %record.from_state.path,
            to = %record.to_state.path,
            sequence = record.sequence,
            "router state changed"
        );

        // Sent under the lock so subscribers observe records in sequence order.
        self.state_tx.send_replace(record.to_state.clone());
        let _ = self.changes_tx.send(record.clone());

        Some(record)
    }

    /// Navigate to a new entry
    pub fn push(&self, path: impl Into<String>) -> Option<ChangeRecord> {
        self.dispatch(NavigationMode::Push, path)
    }

    /// Replace the current entry
    pub fn replace(&self, path: impl Into<String>) -> Option<ChangeRecord> {
        self.dispatch(NavigationMode::Replace, path)
    }

    /// Replace the current entry after a guard redirect
    pub fn redirect(&self, path: impl Into<String>) -> Option<ChangeRecord> {
        self.dispatch(NavigationMode::Redirect, path)
    }

    /// Record a host back/forward navigation
    pub fn pop(&self, path: impl Into<String>) -> Option<ChangeRecord> {
        self.dispatch(NavigationMode::Pop, path)
    }

    /// Current state
    pub fn state(&self) -> RouterState {
        self.inner.lock().state.clone()
    }

    /// Current path
    pub fn path(&self) -> String {
        self.inner.lock().state.path.clone()
    }

    /// Sequence number of the last change (0 before any change)
    pub fn sequence(&self) -> u64 {
        self.inner.lock().sequence
    }

    /// Most recent change record
    pub fn last_change(&self) -> Option<ChangeRecord> {
        self.inner.lock().last_change.clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<RouterState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to change records
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeRecord> {
        self.changes_tx.subscribe()
    }
}

impl Default for RouterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RouterStore")
            .field("path", &inner.state.path)
            .field("sequence", &inner.sequence)
            .finish()
    }
}
