//! Router context
//!
//! One [`Router`] owns a route table, a state store and a history adapter.
//! Routers share nothing, so several can run side by side, each bound to its
//! own host.

use crate::config::RouterConfig;
use crate::error::Result;
use crate::link::{Href, LinkClick};
use history::{
    AdapterOptions, Guard, HistoryAdapter, HistoryAdapterBuilder, ListenerHandle, LoadedParams,
    Loader, Navigation, NavigationHost,
};
use router_state::{ChangeRecord, Direction, RouterState, RouterStore};
use routes::{strip_query_hash, RouteMatch, RouteParams, RouteTable};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use view_scope::{resolve_levels, ScopeResolution, TransitionViewer, ViewTable};

/// What a render sees: the current and previous routes and how we got here
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterSnapshot {
    /// Current path
    pub path: String,
    /// Path before the last change
    pub from_path: Option<String>,
    /// Best match for the current path
    pub to: Option<RouteMatch>,
    /// Best match for the previous path
    pub from: Option<RouteMatch>,
    /// Last change record
    pub change: Option<ChangeRecord>,
    /// Direction of the last change
    pub direction: Direction,
}

/// Builder for [`Router`]
pub struct RouterBuilder {
    config: RouterConfig,
    host: Arc<dyn NavigationHost>,
    table: Arc<RouteTable>,
    store: Arc<RouterStore>,
    adapter: HistoryAdapterBuilder,
}

impl RouterBuilder {
    /// Set the configuration
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a guard
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.adapter = self.adapter.guard(guard);
        self
    }

    /// Install a loader
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.adapter = self.adapter.loader(loader);
        self
    }

    /// Build the router
    ///
    /// Fails if the configuration is invalid.
    pub fn build(self) -> Result<Router> {
        self.config.validate()?;

        let base = self.config.resolve_base(&self.host.location());
        let options = AdapterOptions {
            base,
            use_hash: self.config.use_hash,
            max_redirects: self.config.max_redirects,
        };
        tracing::debug!(base = %options.base, use_hash = options.use_hash, routes = self.table.len(), "router built");

        Ok(Router {
            table: self.table,
            store: self.store,
            adapter: self.adapter.options(options).build(),
            config: self.config,
        })
    }
}

/// Router context
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pathway::{MemoryHistory, Router, RouterConfig, RouteParams};
///
/// let host = Arc::new(MemoryHistory::new("/"));
/// let router = Router::new(
///     [("Home", "/"), ("User", "/users/:userId")],
///     RouterConfig::default().use_hash(false),
///     host.clone(),
/// )
/// .unwrap();
/// router.start();
///
/// let mut params = RouteParams::new();
/// params.insert("userId".to_string(), "42".to_string());
/// router.goto("User", &params).unwrap();
///
/// let snapshot = router.snapshot();
/// assert_eq!(snapshot.path, "/users/42");
/// assert_eq!(snapshot.to.unwrap().name, "User");
/// assert_eq!(snapshot.from.unwrap().name, "Home");
/// ```
#[derive(Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    store: Arc<RouterStore>,
    adapter: HistoryAdapter,
    config: RouterConfig,
}

impl Router {
    /// Start building a router over `routes`
    ///
    /// Fails on duplicate route names or invalid patterns.
    pub fn builder<I, N, P>(routes: I, host: Arc<dyn NavigationHost>) -> Result<RouterBuilder>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let table = Arc::new(RouteTable::new(routes)?);
        let store = Arc::new(RouterStore::new());
        let adapter = HistoryAdapter::builder(store.clone(), table.clone(), host.clone());

        Ok(RouterBuilder {
            config: RouterConfig::default(),
            host,
            table,
            store,
            adapter,
        })
    }

    /// Create a router without hooks
    pub fn new<I, N, P>(routes: I, config: RouterConfig, host: Arc<dyn NavigationHost>) -> Result<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        Self::builder(routes, host)?.config(config).build()
    }

    /// Sync with the host's current location
    pub fn start(&self) -> Option<Navigation> {
        self.adapter.start()
    }

    /// Route table
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// State store
    pub fn store(&self) -> &RouterStore {
        &self.store
    }

    /// History adapter
    pub fn history(&self) -> &HistoryAdapter {
        &self.adapter
    }

    /// Configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Base prefix in effect
    pub fn base(&self) -> &str {
        &self.adapter.options().base
    }

    /// Current state
    pub fn current(&self) -> RouterState {
        self.adapter.current()
    }

    /// Capture the current and previous routes
    pub fn snapshot(&self) -> RouterSnapshot {
        let (state, change, direction) = self.adapter.observe();
        let path = state.path;
        let from_path = change
            .as_ref()
            .map(|change| change.from_state.path.clone())
            .filter(|path| !path.is_empty());

        RouterSnapshot {
            to: self.resolve(&path),
            from: from_path.as_deref().and_then(|path| self.resolve(path)),
            path,
            from_path,
            change,
            direction,
        }
    }

    /// Resolve every nesting level for the current snapshot
    ///
    /// A level keeps the retention count set on its own table.
    pub fn levels<V>(&self, tables: &[&ViewTable<V>]) -> Vec<ScopeResolution<V>> {
        let snapshot = self.snapshot();
        resolve_levels(tables, snapshot.to.as_ref(), snapshot.from.as_ref())
    }

    /// Viewer configured with this router's exit timeout and appear setting
    pub fn viewer<C>(&self) -> TransitionViewer<C> {
        TransitionViewer::new(self.config.exit_timeout()).with_appear(self.config.appear)
    }

    /// Navigate to a named route
    ///
    /// Fails if the route is unknown or a required parameter is missing.
    pub fn goto(&self, name: &str, params: &RouteParams) -> Result<Option<Navigation>> {
        let path = self.table.build_path(name, params)?;
        Ok(self.adapter.push(path))
    }

    /// Replace the current entry with a named route
    pub fn replace_to(&self, name: &str, params: &RouteParams) -> Result<Option<Navigation>> {
        let path = self.table.build_path(name, params)?;
        Ok(self.adapter.replace(path))
    }

    /// Navigate to a path
    pub fn push(&self, path: impl Into<String>) -> Option<Navigation> {
        self.adapter.push(path)
    }

    /// Replace the current entry with a path
    pub fn replace(&self, path: impl Into<String>) -> Option<Navigation> {
        self.adapter.replace(path)
    }

    /// Replace the current entry with a path as a redirect
    pub fn redirect(&self, path: impl Into<String>) -> Option<Navigation> {
        self.adapter.redirect(path)
    }

    /// Go back one entry
    pub fn back(&self) {
        self.adapter.back();
    }

    /// Go forward one entry
    pub fn forward(&self) {
        self.adapter.forward();
    }

    /// Apply queued host notifications
    pub fn process_pending_events(&self) -> Vec<Navigation> {
        self.adapter.process_pending_events()
    }

    /// Apply host notifications on a background task
    pub fn spawn_listener(&self) -> Result<ListenerHandle> {
        Ok(self.adapter.spawn_listener()?)
    }

    /// Wait for outstanding guard and loader runs
    pub async fn settle(&self) {
        self.adapter.settle().await;
    }

    /// Latest current loader result
    pub fn loaded(&self) -> Option<LoadedParams> {
        self.adapter.loaded()
    }

    /// Subscribe to committed navigations
    pub fn subscribe(&self) -> broadcast::Receiver<Navigation> {
        self.adapter.subscribe()
    }

    /// Link target for a named route
    pub fn href(&self, name: &str, params: &RouteParams) -> Href {
        match self.table.build_path(name, params) {
            Ok(path) => Href::valid(history::to_url(&path, self.base(), self.config.use_hash)),
            Err(err) => {
                tracing::debug!(route = name, error = %err, "link cannot be resolved");
                Href::missing_params()
            }
        }
    }

    /// Handle a click on a link to a named route
    ///
    /// Returns whether the router took over the click. Clicks the host
    /// should handle itself, and links that cannot be resolved, are left
    /// alone.
    pub fn follow_link(&self, name: &str, params: &RouteParams, click: &LinkClick) -> bool {
        if !click.should_intercept() {
            return false;
        }
        match self.table.build_path(name, params) {
            Ok(path) => {
                self.adapter.push(path);
                true
            }
            Err(_) => false,
        }
    }

    fn resolve(&self, path: &str) -> Option<RouteMatch> {
        if path.is_empty() {
            return None;
        }
        self.table.match_path(strip_query_hash(path))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("store", &self.store)
            .field("routes", &self.table.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{Modifiers, MISSING_PARAMS};
    use history::MemoryHistory;
    use routes::RouteError;
    use view_scope::{Lifecycle, Viewer, ViewerInput};

    const ROUTES: [(&str, &str); 4] = [
        ("Home", "/"),
        ("About", "/about"),
        ("Users", "/users"),
        ("User", "/users/:userId"),
    ];

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn path_router(url: &str) -> (Router, Arc<MemoryHistory>) {
        let host = Arc::new(MemoryHistory::new(url));
        let router = Router::new(ROUTES, RouterConfig::default().use_hash(false), host.clone()).unwrap();
        router.start();
        (router, host)
    }

    #[test]
    fn test_duplicate_routes_rejected() {
        let host = Arc::new(MemoryHistory::new("/"));
        let result = Router::new([("A", "/a"), ("A", "/b")], RouterConfig::default(), host);
        assert!(matches!(
            result,
            Err(crate::RouterError::Route(RouteError::DuplicateRouteName(_)))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let host = Arc::new(MemoryHistory::new("/"));
        let result = Router::new(ROUTES, RouterConfig::default().base("app"), host);
        assert!(matches!(result, Err(crate::RouterError::Config(_))));
    }

    #[test]
    fn test_hash_mode_derives_base() {
        let host = Arc::new(MemoryHistory::new("/docs/#/about"));
        let router = Router::new(ROUTES, RouterConfig::default(), host).unwrap();
        router.start();
        assert_eq!(router.base(), "/docs");
        assert_eq!(router.current().path, "/about");
        assert_eq!(router.href("Users", &RouteParams::new()).href, "/docs#/users");
    }

    #[test]
    fn test_snapshot_before_start() {
        let host = Arc::new(MemoryHistory::new("/"));
        let router = Router::new(ROUTES, RouterConfig::default(), host).unwrap();
        let snapshot = router.snapshot();
        assert_eq!(snapshot.path, "");
        assert!(snapshot.change.is_none());
        assert!(snapshot.to.is_none());
    }

    #[test]
    fn test_snapshot_after_start() {
        let (router, _host) = path_router("/about");
        let snapshot = router.snapshot();
        assert_eq!(snapshot.to.unwrap().name, "About");
        assert!(snapshot.from_path.is_none());
        assert!(snapshot.from.is_none());
        assert_eq!(snapshot.direction, Direction::Replace);
    }

    #[test]
    fn test_snapshot_ignores_query() {
        let (router, _host) = path_router("/");
        router.push("/users/9?tab=likes");
        let snapshot = router.snapshot();
        let to = snapshot.to.unwrap();
        assert_eq!(to.name, "User");
        assert_eq!(to.params["userId"], "9");
        assert_eq!(snapshot.from.unwrap().name, "Home");
    }

    #[test]
    fn test_viewer_follows_appear_setting() {
        let (router, _host) = path_router("/");
        let mut viewer = router.viewer::<&str>();
        let home = ViewerInput::new(Some("Home".to_string()), Direction::Replace, 0);
        viewer.update(home.clone(), &mut || "home", tokio::time::Instant::now());
        assert_eq!(viewer.layers()[0].lifecycle, Lifecycle::Settled);

        let host = Arc::new(MemoryHistory::new("/"));
        let config = RouterConfig::default().use_hash(false).appear(true);
        let router = Router::new(ROUTES, config, host).unwrap();
        let mut viewer = router.viewer::<&str>();
        viewer.update(home, &mut || "home", tokio::time::Instant::now());
        assert_eq!(viewer.layers()[0].lifecycle, Lifecycle::Appearing);
        assert!(viewer.is_changing());
    }

    #[test]
    fn test_goto_and_replace_to() {
        let (router, host) = path_router("/");
        let nav = router.goto("User", &params(&[("userId", "5")])).unwrap().unwrap();
        assert_eq!(nav.direction, Direction::Forward);
        assert_eq!(host.url(), "/users/5");

        let nav = router.replace_to("About", &RouteParams::new()).unwrap().unwrap();
        assert_eq!(nav.direction, Direction::Replace);
        assert_eq!(host.len(), 2);
    }

    #[test]
    fn test_goto_missing_param() {
        let (router, _host) = path_router("/");
        let err = router.goto("User", &RouteParams::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::RouterError::Route(RouteError::MissingParam { .. })
        ));
        assert_eq!(router.current().path, "/");
    }

    #[test]
    fn test_href() {
        let (router, _host) = path_router("/");
        assert_eq!(
            router.href("User", &params(&[("userId", "a b")])),
            Href::valid("/users/a%20b")
        );

        let invalid = router.href("User", &RouteParams::new());
        assert_eq!(invalid.href, "#");
        assert_eq!(invalid.invalid, Some(MISSING_PARAMS));
        assert!(!router.href("Nope", &RouteParams::new()).is_valid());
    }

    #[test]
    fn test_follow_link() {
        let (router, _host) = path_router("/");

        let modified = LinkClick::primary().with_modifiers(Modifiers {
            meta: true,
            ..Default::default()
        });
        assert!(!router.follow_link("About", &RouteParams::new(), &modified));
        assert_eq!(router.current().path, "/");

        assert!(!router.follow_link("User", &RouteParams::new(), &LinkClick::primary()));
        assert!(router.follow_link("About", &RouteParams::new(), &LinkClick::primary()));
        assert_eq!(router.current().path, "/about");
    }

    #[test]
    fn test_routers_are_independent() {
        let (a, _) = path_router("/");
        let (b, _) = path_router("/users");
        a.push("/about");
        assert_eq!(a.current().path, "/about");
        assert_eq!(b.current().path, "/users");
        assert_eq!(b.store().sequence(), 1);
    }
}
