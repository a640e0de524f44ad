//! Route table
//!
//! Holds every compiled pattern for one router instance. Names are unique;
//! the table is immutable after construction.

use crate::error::{Result, RouteError};
use crate::pattern::{RouteMatch, RouteParams, RoutePattern};
use std::collections::HashMap;

/// URL router for matching paths to named routes and building paths back
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Patterns in registration order
    patterns: Vec<RoutePattern>,
    /// Name to index in `patterns`
    by_name: HashMap<String, usize>,
    /// Indices into `patterns`, most specific first
    ranked: Vec<usize>,
}

impl RouteTable {
    /// Compile a set of `(name, pattern)` pairs
    ///
    /// Fails with [`RouteError::DuplicateRouteName`] if a name repeats, or
    /// [`RouteError::InvalidPattern`] if a pattern cannot be compiled.
    pub fn new<I, N, P>(routes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let mut patterns = Vec::new();
        let mut by_name = HashMap::new();

        for (name, pattern) in routes {
            let compiled = RoutePattern::compile(name, pattern)?;
            if by_name.contains_key(compiled.name()) {
                return Err(RouteError::DuplicateRouteName(compiled.name().to_string()));
            }
            by_name.insert(compiled.name().to_string(), patterns.len());
            patterns.push(compiled);
        }

        // Equal scores put the later registration first.
        let mut ranked: Vec<usize> = (0..patterns.len()).collect();
        ranked.sort_by(|&a, &b| {
            patterns[b]
                .specificity()
                .cmp(&patterns[a].specificity())
                .then(b.cmp(&a))
        });

        tracing::debug!(routes = patterns.len(), "compiled route table");

        Ok(Self {
            patterns,
            by_name,
            ranked,
        })
    }

    /// Look up the compiled pattern for a route name
    pub fn route(&self, name: &str) -> Option<&RoutePattern> {
        self.by_name.get(name).map(|&idx| &self.patterns[idx])
    }

    /// Route names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(RoutePattern::name)
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the table has no routes
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Build a path for a named route
    pub fn build_path(&self, name: &str, params: &RouteParams) -> Result<String> {
        self.route(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?
            .build(params)
    }

    /// Match a path against a single named route
    pub fn match_one(&self, name: &str, path: &str) -> Option<RouteMatch> {
        self.route(name)?.match_path(path)
    }

    /// Match a path against every route, most specific first
    pub fn match_all(&self, path: &str) -> Vec<RouteMatch> {
        self.ranked
            .iter()
            .filter_map(|&idx| self.patterns[idx].match_path(path))
            .collect()
    }

    /// Best match for a path, if any
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.ranked
            .iter()
            .find_map(|&idx| self.patterns[idx].match_path(path))
    }
}
