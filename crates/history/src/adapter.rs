//! History adapter
//!
//! Binds the router store to a [`NavigationHost`]:
//!
//! - Normalizes raw host locations into canonical paths
//! - Persists a session index with every entry it writes (incremented on
//!   push, unchanged on replace/redirect) and reads it back on pop
//! - Infers the [`Direction`] of every committed transition
//! - Runs the optional guard and loader hooks on spawned tasks, applying
//!   their results only while the store sequence they were started for is
//!   still current

use crate::error::{HistoryError, Result};
use crate::hooks::{Guard, GuardContext, GuardOutcome, Loader, LoaderContext};
use crate::host::{EntryState, HostEvent, NavigationHost};
use crate::location::{normalize, path_from_location, to_url};
use parking_lot::Mutex;
use router_state::{ChangeRecord, Direction, NavigationMode, RouterState, RouterStore};
use routes::{strip_query_hash, RouteParams, RouteTable};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default limit on chained guard redirects
pub const DEFAULT_MAX_REDIRECTS: u32 = 16;

/// Capacity of the navigation event channel
const NAVIGATION_CHANNEL_CAPACITY: usize = 64;

/// History adapter options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Prefix stripped from host paths and prepended to written URLs
    pub base: String,
    /// Route on the URL fragment instead of the path
    pub use_hash: bool,
    /// Longest chain of guard redirects followed before giving up
    pub max_redirects: u32,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            base: String::new(),
            use_hash: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// A committed transition together with its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// The store's change record
    pub change: ChangeRecord,
    /// Inferred direction
    pub direction: Direction,
}

/// Extra parameters returned by a loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedParams {
    /// Store sequence the loader ran for
    pub sequence: u64,
    /// Path the loader ran for
    pub path: String,
    /// Returned parameters
    pub params: RouteParams,
}

#[derive(Debug, Default)]
struct Session {
    /// Session index of the entry the store currently reflects
    observed_index: Option<u64>,
    started: bool,
    last: Option<Navigation>,
}

struct AdapterInner {
    store: Arc<RouterStore>,
    table: Arc<RouteTable>,
    host: Arc<dyn NavigationHost>,
    options: AdapterOptions,
    guard: Option<Arc<dyn Guard>>,
    loader: Option<Arc<dyn Loader>>,
    /// Held for the whole of every transition, so host writes and store
    /// dispatches never interleave.
    session: Mutex<Session>,
    events: Mutex<Option<mpsc::UnboundedReceiver<HostEvent>>>,
    hook_tasks: Mutex<Vec<JoinHandle<()>>>,
    loaded: Mutex<Option<LoadedParams>>,
    navigations_tx: broadcast::Sender<Navigation>,
}

/// Builder for [`HistoryAdapter`]
pub struct HistoryAdapterBuilder {
    store: Arc<RouterStore>,
    table: Arc<RouteTable>,
    host: Arc<dyn NavigationHost>,
    options: AdapterOptions,
    guard: Option<Arc<dyn Guard>>,
    loader: Option<Arc<dyn Loader>>,
}

impl HistoryAdapterBuilder {
    /// Replace all options
    pub fn options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the base prefix
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.options.base = base.into();
        self
    }

    /// Enable or disable hash routing
    pub fn use_hash(mut self, use_hash: bool) -> Self {
        self.options.use_hash = use_hash;
        self
    }

    /// Limit chained guard redirects
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.options.max_redirects = max;
        self
    }

    /// Install a guard
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Install a loader
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Build the adapter
    pub fn build(self) -> HistoryAdapter {
        let (navigations_tx, _) = broadcast::channel(NAVIGATION_CHANNEL_CAPACITY);
        HistoryAdapter {
            inner: Arc::new(AdapterInner {
                store: self.store,
                table: self.table,
                host: self.host,
                options: self.options,
                guard: self.guard,
                loader: self.loader,
                session: Mutex::new(Session::default()),
                events: Mutex::new(None),
                hook_tasks: Mutex::new(Vec::new()),
                loaded: Mutex::new(None),
                navigations_tx,
            }),
        }
    }
}

/// Adapter between the router store and a navigation host
///
/// Cloning is cheap; clones share the same state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use history::{HistoryAdapter, MemoryHistory};
/// use router_state::{Direction, RouterStore};
/// use routes::RouteTable;
///
/// let table = Arc::new(RouteTable::new([("Home", "/"), ("About", "/about")]).unwrap());
/// let store = Arc::new(RouterStore::new());
/// let host = Arc::new(MemoryHistory::new("/"));
///
/// let adapter = HistoryAdapter::builder(store.clone(), table, host).build();
/// adapter.start();
///
/// let nav = adapter.push("/about").unwrap();
/// assert_eq!(nav.direction, Direction::Forward);
/// assert_eq!(store.path(), "/about");
/// ```
#[derive(Clone)]
pub struct HistoryAdapter {
    inner: Arc<AdapterInner>,
}

impl HistoryAdapter {
    /// Start building an adapter
    pub fn builder(
        store: Arc<RouterStore>,
        table: Arc<RouteTable>,
        host: Arc<dyn NavigationHost>,
    ) -> HistoryAdapterBuilder {
        HistoryAdapterBuilder {
            store,
            table,
            host,
            options: AdapterOptions::default(),
            guard: None,
            loader: None,
        }
    }

    /// Adapter options
    pub fn options(&self) -> &AdapterOptions {
        &self.inner.options
    }

    /// The store this adapter drives
    pub fn store(&self) -> &Arc<RouterStore> {
        &self.inner.store
    }

    /// The route table used for hook contexts
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.inner.table
    }

    /// Initialize from the host's current location
    ///
    /// Subscribes to host notifications, seeds the session index if the
    /// current entry has none, and applies a `replace` to the current path.
    /// Calling it again has no effect.
    pub fn start(&self) -> Option<Navigation> {
        let mut session = self.inner.session.lock();
        if session.started {
            return None;
        }
        session.started = true;

        *self.inner.events.lock() = Some(self.inner.host.subscribe());

        let index = self.ensure_session_index();
        session.observed_index = Some(index);

        let path = self.location_path();
        tracing::debug!(%path, index, "history adapter started");

        let change = self.inner.store.replace(path.clone())?;
        let navigation = self.commit(&mut session, change, Direction::Replace);
        drop(session);

        self.run_hooks(navigation.change.sequence, path, 0);
        Some(navigation)
    }

    /// Navigate to a new entry
    pub fn push(&self, path: impl Into<String>) -> Option<Navigation> {
        self.apply(NavigationMode::Push, path.into(), 0, None)
    }

    /// Replace the current entry
    pub fn replace(&self, path: impl Into<String>) -> Option<Navigation> {
        self.apply(NavigationMode::Replace, path.into(), 0, None)
    }

    /// Replace the current entry as a redirect
    pub fn redirect(&self, path: impl Into<String>) -> Option<Navigation> {
        self.apply(NavigationMode::Redirect, path.into(), 0, None)
    }

    /// Ask the host to go back one entry
    ///
    /// The resulting transition is applied when the host's notification is
    /// processed.
    pub fn back(&self) {
        self.inner.host.go(-1);
    }

    /// Ask the host to go forward one entry
    pub fn forward(&self) {
        self.inner.host.go(1);
    }

    /// Current router state
    pub fn current(&self) -> RouterState {
        self.inner.store.state()
    }

    /// Most recent committed navigation
    pub fn last_navigation(&self) -> Option<Navigation> {
        self.inner.session.lock().last.clone()
    }

    /// Direction of the most recent committed navigation
    pub fn direction(&self) -> Direction {
        self.inner
            .session
            .lock()
            .last
            .as_ref()
            .map(|nav| nav.direction)
            .unwrap_or_default()
    }

    /// Current state, last change record and its direction, read together
    ///
    /// Taken under the session lock, so the three always belong to the
    /// same navigation even while another thread is navigating.
    pub fn observe(&self) -> (RouterState, Option<ChangeRecord>, Direction) {
        let session = self.inner.session.lock();
        let state = self.inner.store.state();
        let change = self.inner.store.last_change();
        let direction = match (&change, &session.last) {
            (Some(change), Some(last)) if last.change.sequence == change.sequence => last.direction,
            (Some(change), _) => Direction::infer(change.mode, None, None),
            (None, _) => Direction::default(),
        };
        (state, change, direction)
    }

    /// Session index of the entry the store currently reflects
    pub fn session_index(&self) -> Option<u64> {
        self.inner.session.lock().observed_index
    }

    /// Latest loader result that was not superseded
    pub fn loaded(&self) -> Option<LoadedParams> {
        self.inner.loaded.lock().clone()
    }

    /// Subscribe to committed navigations
    pub fn subscribe(&self) -> broadcast::Receiver<Navigation> {
        self.inner.navigations_tx.subscribe()
    }

    /// Handle one host notification
    ///
    /// Fragment changes are ignored unless hash routing is enabled.
    pub fn handle_host_event(&self, event: HostEvent) -> Option<Navigation> {
        if event == HostEvent::HashChange && !self.inner.options.use_hash {
            return None;
        }

        let mut session = self.inner.session.lock();
        let path = self.location_path();

        let landed = self.inner.host.entry_state().and_then(|state| state.index);
        let previous = session.observed_index;
        let current = landed.or(previous);
        let direction = Direction::infer(NavigationMode::Pop, previous, current);
        session.observed_index = current;

        let change = self.inner.store.pop(path.clone())?;
        let navigation = self.commit(&mut session, change, direction);
        drop(session);

        self.run_hooks(navigation.change.sequence, path, 0);
        Some(navigation)
    }

    /// Drain queued host notifications without a listener task
    pub fn process_pending_events(&self) -> Vec<Navigation> {
        let mut navigations = Vec::new();
        loop {
            let event = match self.inner.events.lock().as_mut() {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            let Some(event) = event else { break };
            if let Some(navigation) = self.handle_host_event(event) {
                navigations.push(navigation);
            }
        }
        navigations
    }

    /// Spawn a task that applies host notifications as they arrive
    ///
    /// Requires [`start`](Self::start) to have been called. The task stops
    /// when the returned handle is dropped.
    pub fn spawn_listener(&self) -> Result<ListenerHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| HistoryError::NoRuntime)?;
        let mut rx = self
            .inner
            .events
            .lock()
            .take()
            .ok_or(HistoryError::ListenerUnavailable)?;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let adapter = self.clone();

        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(event) => {
                            adapter.handle_host_event(event);
                        }
                        None => break,
                    },
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });

        Ok(ListenerHandle {
            stop_tx: Some(stop_tx),
            _handle: handle,
        })
    }

    /// Wait for every outstanding guard/loader task, including redirects
    /// they trigger
    pub async fn settle(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.inner.hook_tasks.lock());
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(err) = task.await {
                    tracing::debug!(error = %err, "navigation hook task ended abnormally");
                }
            }
        }
    }

    fn apply(
        &self,
        mode: NavigationMode,
        path: String,
        depth: u32,
        expected_sequence: Option<u64>,
    ) -> Option<Navigation> {
        let mut session = self.inner.session.lock();

        if let Some(expected) = expected_sequence {
            if self.inner.store.sequence() != expected {
                tracing::debug!(%mode, %path, "discarding stale redirect");
                return None;
            }
        }

        if self.inner.store.path() == path {
            tracing::trace!(%mode, %path, "navigation to current path ignored");
            return None;
        }

        let current = self.inner.host.entry_state().unwrap_or_default();
        let current_index = current.index.or(session.observed_index).unwrap_or(0);
        let next_index = match mode {
            NavigationMode::Push => current_index.saturating_add(1),
            _ => current_index,
        };

        let state = EntryState {
            index: Some(next_index),
            key: Some(uuid::Uuid::new_v4().to_string()),
            extra: current.extra,
        };
        let url = to_url(&path, &self.inner.options.base, self.inner.options.use_hash);
        let written = match mode {
            NavigationMode::Push => self.inner.host.push_entry(state, &url),
            _ => self.inner.host.replace_entry(state, &url),
        };
        if let Err(err) = written {
            tracing::warn!(%mode, %url, error = %err, "history entry write failed");
        }
        session.observed_index = Some(next_index);

        let change = self.inner.store.dispatch(mode, path.clone())?;
        let direction = Direction::infer(mode, None, None);
        let navigation = self.commit(&mut session, change, direction);
        drop(session);

        self.run_hooks(navigation.change.sequence, path, depth);
        Some(navigation)
    }

    fn commit(&self, session: &mut Session, change: ChangeRecord, direction: Direction) -> Navigation {
        let navigation = Navigation { change, direction };
        tracing::debug!(
            mode = %navigation.change.mode,
            %direction,
            path = %navigation.change.to_state.path,
            index = ?session.observed_index,
            "navigation committed"
        );
        session.last = Some(navigation.clone());
        let _ = self.inner.navigations_tx.send(navigation.clone());
        navigation
    }

    fn location_path(&self) -> String {
        path_from_location(
            &self.inner.host.location(),
            &self.inner.options.base,
            self.inner.options.use_hash,
        )
    }

    /// Read the current entry's session index, seeding 0 if absent
    fn ensure_session_index(&self) -> u64 {
        let state = self.inner.host.entry_state().unwrap_or_default();
        if let Some(index) = state.index {
            return index;
        }

        let url = self.inner.host.location().href();
        let seeded = EntryState {
            index: Some(0),
            ..state
        };
        if let Err(err) = self.inner.host.replace_entry(seeded, &url) {
            tracing::warn!(%url, error = %err, "failed to seed session index");
        }
        0
    }

    fn run_hooks(&self, sequence: u64, full_path: String, depth: u32) {
        if self.inner.guard.is_none() && self.inner.loader.is_none() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(path = %full_path, "no tokio runtime; navigation hooks skipped");
            return;
        };

        let adapter = self.clone();
        let task = runtime.spawn(async move {
            adapter.guard_and_load(sequence, full_path, depth).await;
        });

        let mut tasks = self.inner.hook_tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    async fn guard_and_load(self, sequence: u64, full_path: String, depth: u32) {
        let path = strip_query_hash(&full_path).to_string();
        let chain = self.inner.table.match_all(&path);
        let route = chain.first().cloned();
        let params = route.as_ref().map(|m| m.params.clone());
        let ctx = GuardContext {
            full_path,
            path,
            params,
            route,
            chain,
        };

        if let Some(guard) = self.inner.guard.clone() {
            match guard.check(&ctx).await {
                Ok(GuardOutcome::Allow) => {}
                Ok(GuardOutcome::Redirect(target)) => {
                    if depth >= self.inner.options.max_redirects {
                        tracing::warn!(
                            from = %ctx.full_path,
                            to = %target,
                            depth,
                            "guard redirect chain abandoned"
                        );
                        return;
                    }
                    let target = normalize(&target, "");
                    self.apply(NavigationMode::Redirect, target, depth + 1, Some(sequence));
                    return;
                }
                Err(err) => {
                    tracing::debug!(path = %ctx.path, error = %err, "guard failed; navigation allowed");
                }
            }
        }

        if let Some(loader) = self.inner.loader.clone() {
            let ctx = LoaderContext::from(ctx);
            match loader.load(&ctx).await {
                Ok(Some(params)) => {
                    let _session = self.inner.session.lock();
                    if self.inner.store.sequence() == sequence {
                        *self.inner.loaded.lock() = Some(LoadedParams {
                            sequence,
                            path: ctx.path,
                            params,
                        });
                    } else {
                        tracing::debug!(path = %ctx.path, "discarding stale loader result");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(path = %ctx.path, error = %err, "loader failed");
                }
            }
        }
    }
}

/// Handle for the host event listener task
///
/// When dropped, the listener stops.
pub struct ListenerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop listening
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
