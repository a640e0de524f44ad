//! Per-level scope resolution
//!
//! A level is in scope when the current route name is bound in its view
//! table. Its scope key is the bound view's identity, so route names that
//! alias the same view never register as a change. Views keyed by a
//! parameter append that parameter's value to the key.

use routes::{RouteMatch, RouteParams};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct ViewInner<V> {
    identity: String,
    keyed_by: Option<String>,
    content: V,
}

/// A view that can be bound to one or more route names
///
/// Cloning shares the view; every clone has the same identity.
pub struct View<V> {
    inner: Arc<ViewInner<V>>,
}

impl<V> View<V> {
    /// Create a view whose scope key is its identity
    pub fn new(identity: impl Into<String>, content: V) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                identity: identity.into(),
                keyed_by: None,
                content,
            }),
        }
    }

    /// Create a view whose scope key also includes the value of `param`
    pub fn keyed(identity: impl Into<String>, param: impl Into<String>, content: V) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                identity: identity.into(),
                keyed_by: Some(param.into()),
                content,
            }),
        }
    }

    /// View identity
    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// Parameter the scope key depends on, if any
    pub fn keyed_by(&self) -> Option<&str> {
        self.inner.keyed_by.as_deref()
    }

    /// View content
    pub fn content(&self) -> &V {
        &self.inner.content
    }

    /// Scope key for this view under `params`
    ///
    /// An absent or empty key parameter yields the identity alone.
    pub fn scope_key(&self, params: &RouteParams) -> String {
        match self
            .keyed_by()
            .and_then(|param| params.get(param))
            .filter(|value| !value.is_empty())
        {
            Some(value) => format!("{}:{}", self.identity(), value),
            None => self.identity().to_string(),
        }
    }
}

impl<V> Clone for View<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> PartialEq for View<V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.identity == other.inner.identity && self.inner.keyed_by == other.inner.keyed_by
    }
}

impl<V> fmt::Debug for View<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("identity", &self.inner.identity)
            .field("keyed_by", &self.inner.keyed_by)
            .finish()
    }
}

/// Route name to view mapping for one nesting level
///
/// A table may carry its own retention count, which overrides the derived
/// keep for this level only.
pub struct ViewTable<V> {
    views: HashMap<String, View<V>>,
    keep: Option<usize>,
}

impl<V> ViewTable<V> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            keep: None,
        }
    }

    /// Retain `keep` previous layers at this level on every transition
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = Some(keep);
        self
    }

    /// Set or clear this level's retention count in place
    pub fn set_keep(&mut self, keep: Option<usize>) {
        self.keep = keep;
    }

    /// This level's retention count, if set
    pub fn keep(&self) -> Option<usize> {
        self.keep
    }

    /// Bind a route name to a view
    pub fn bind(mut self, route_name: impl Into<String>, view: &View<V>) -> Self {
        self.insert(route_name, view);
        self
    }

    /// Bind a route name to a view in place
    pub fn insert(&mut self, route_name: impl Into<String>, view: &View<V>) {
        self.views.insert(route_name.into(), view.clone());
    }

    /// View bound to a route name
    pub fn get(&self, route_name: &str) -> Option<&View<V>> {
        self.views.get(route_name)
    }

    /// Check if a route name is bound
    pub fn contains(&self, route_name: &str) -> bool {
        self.views.contains_key(route_name)
    }

    /// Number of bound route names
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Check if no route name is bound
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Scope key of a match at this level, `None` when out of scope
    pub fn scope_key(&self, route: &RouteMatch) -> Option<String> {
        self.get(&route.name).map(|view| view.scope_key(&route.params))
    }
}

impl<V> Default for ViewTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ViewTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTable")
            .field("views", &self.views)
            .field("keep", &self.keep)
            .finish()
    }
}

/// Resolution of one level for a current/previous match pair
#[derive(Debug, Clone)]
pub struct ScopeResolution<V> {
    /// The current route is bound at this level
    pub in_scope: bool,
    /// Scope key of the current route
    pub scope_key: Option<String>,
    /// Scope key of the previous route
    pub previous_key: Option<String>,
    /// Both keys exist and differ
    pub scope_changed: bool,
    /// Layers the viewer should retain during the transition
    pub effective_keep: usize,
    /// View to render
    pub view: Option<View<V>>,
    /// Parameters to render the view with
    pub params: RouteParams,
}

/// Resolve one level
///
/// `keep` overrides the derived retention count (1 on a scope change, else 0).
pub fn resolve<V>(
    table: &ViewTable<V>,
    to: Option<&RouteMatch>,
    from: Option<&RouteMatch>,
    keep: Option<usize>,
) -> ScopeResolution<V> {
    let view = to.and_then(|route| table.get(&route.name)).cloned();
    let scope_key = to.and_then(|route| table.scope_key(route));
    let previous_key = from.and_then(|route| table.scope_key(route));

    let scope_changed = matches!(
        (&scope_key, &previous_key),
        (Some(current), Some(previous)) if current != previous
    );
    let effective_keep = keep.unwrap_or(usize::from(scope_changed));

    tracing::trace!(
        to = ?to.map(|route| &route.name),
        scope_key = ?scope_key,
        previous_key = ?previous_key,
        scope_changed,
        effective_keep,
        "scope resolved"
    );

    ScopeResolution {
        in_scope: view.is_some(),
        scope_key,
        previous_key,
        scope_changed,
        effective_keep,
        view,
        params: to.map(|route| route.params.clone()).unwrap_or_default(),
    }
}

/// Resolve every level independently, outermost first
///
/// Each level uses its own table's retention count.
pub fn resolve_levels<V>(
    tables: &[&ViewTable<V>],
    to: Option<&RouteMatch>,
    from: Option<&RouteMatch>,
) -> Vec<ScopeResolution<V>> {
    tables
        .iter()
        .map(|table| resolve(table, to, from, table.keep()))
        .collect()
}
