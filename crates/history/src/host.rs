//! Navigation host
//!
//! The host owns the session history: a list of entries, each with a URL and
//! a small persisted state. Browsers, webviews and tests implement
//! [`NavigationHost`]; [`MemoryHistory`] is a complete in-process host.

use crate::error::HostError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Raw location as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path component, always starting with `/`
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
    /// Fragment including the leading `#`, or empty
    pub hash: String,
}

impl Location {
    /// Split a URL-like string into its components
    pub fn parse(url: &str) -> Self {
        let (before_hash, hash) = match url.find('#') {
            Some(idx) => (&url[..idx], &url[idx..]),
            None => (url, ""),
        };
        let (pathname, search) = match before_hash.find('?') {
            Some(idx) => (&before_hash[..idx], &before_hash[idx..]),
            None => (before_hash, ""),
        };

        Self {
            pathname: if pathname.is_empty() {
                "/".to_string()
            } else {
                pathname.to_string()
            },
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    /// Reassemble the location
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// State persisted with a history entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryState {
    /// Session index used for direction inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Unique key of the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Fields written by other code, preserved across updates
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntryState {
    /// Entry state carrying only a session index
    pub fn with_index(index: u64) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

/// Notification delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The user moved back or forward through history
    PopState,
    /// The URL fragment changed
    HashChange,
}

/// Host navigation primitives
#[cfg_attr(test, mockall::automock)]
pub trait NavigationHost: Send + Sync {
    /// Current raw location
    fn location(&self) -> Location;

    /// State of the current entry, if any was persisted
    fn entry_state(&self) -> Option<EntryState>;

    /// Add a new entry after the current one
    fn push_entry(&self, state: EntryState, url: &str) -> Result<(), HostError>;

    /// Overwrite the current entry
    fn replace_entry(&self, state: EntryState, url: &str) -> Result<(), HostError>;

    /// Move through history by `delta` entries
    fn go(&self, delta: i64);

    /// Receive host notifications
    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    url: String,
    state: Option<EntryState>,
}

#[derive(Debug)]
struct MemoryInner {
    entries: Vec<MemoryEntry>,
    cursor: usize,
    subscribers: Vec<mpsc::UnboundedSender<HostEvent>>,
    fail_writes: bool,
}

impl MemoryInner {
    fn current(&self) -> &MemoryEntry {
        &self.entries[self.cursor]
    }

    fn emit(&mut self, event: HostEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// In-memory session history
///
/// Behaves like a browser's history stack: pushing discards forward entries,
/// moving through history emits [`HostEvent::PopState`] (plus
/// [`HostEvent::HashChange`] when the fragment differs).
///
/// # Example
///
/// ```
/// use history::{MemoryHistory, NavigationHost, EntryState};
///
/// let host = MemoryHistory::new("/");
/// host.push_entry(EntryState::with_index(1), "/a").unwrap();
/// assert_eq!(host.location().pathname, "/a");
///
/// host.go(-1);
/// assert_eq!(host.location().pathname, "/");
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<MemoryInner>,
}

impl MemoryHistory {
    /// Create a history with a single entry and no persisted state
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                entries: vec![MemoryEntry {
                    url: url.into(),
                    state: None,
                }],
                cursor: 0,
                subscribers: Vec::new(),
                fail_writes: false,
            }),
        }
    }

    /// URL of the current entry
    pub fn url(&self) -> String {
        self.inner.lock().current().url.clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the history is empty (never true)
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Position of the current entry
    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }

    /// Navigate to a fragment the way a user editing the URL would
    ///
    /// Adds an entry without persisted state and emits [`HostEvent::HashChange`].
    pub fn set_hash(&self, fragment: &str) {
        let mut inner = self.inner.lock();
        let mut location = Location::parse(&inner.current().url);
        location.hash = format!("#{}", fragment.trim_start_matches('#'));

        let cursor = inner.cursor;
        inner.entries.truncate(cursor + 1);
        inner.entries.push(MemoryEntry {
            url: location.href(),
            state: None,
        });
        inner.cursor += 1;
        inner.emit(HostEvent::HashChange);
    }

    /// Make subsequent entry writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }
}

impl NavigationHost for MemoryHistory {
    fn location(&self) -> Location {
        Location::parse(&self.inner.lock().current().url)
    }

    fn entry_state(&self) -> Option<EntryState> {
        self.inner.lock().current().state.clone()
    }

    fn push_entry(&self, state: EntryState, url: &str) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(HostError::WriteFailed(format!("push {}", url)));
        }
        let cursor = inner.cursor;
        inner.entries.truncate(cursor + 1);
        inner.entries.push(MemoryEntry {
            url: url.to_string(),
            state: Some(state),
        });
        inner.cursor += 1;
        Ok(())
    }

    fn replace_entry(&self, state: EntryState, url: &str) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(HostError::WriteFailed(format!("replace {}", url)));
        }
        let cursor = inner.cursor;
        inner.entries[cursor] = MemoryEntry {
            url: url.to_string(),
            state: Some(state),
        };
        Ok(())
    }

    fn go(&self, delta: i64) {
        let mut inner = self.inner.lock();
        let target = isize::try_from(delta)
            .ok()
            .filter(|&delta| delta != 0)
            .and_then(|delta| inner.cursor.checked_add_signed(delta))
            .filter(|&target| target < inner.entries.len());
        let Some(target) = target else {
            return;
        };

        let old_hash = Location::parse(&inner.current().url).hash;
        inner.cursor = target;
        let new_hash = Location::parse(&inner.current().url).hash;

        inner.emit(HostEvent::PopState);
        if old_hash != new_hash {
            inner.emit(HostEvent::HashChange);
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }
}
