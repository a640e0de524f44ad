//! Guard and loader hooks
//!
//! Both hooks run after the store has committed a transition, on a spawned
//! task. Errors are logged and otherwise ignored: navigation proceeds as if
//! the hook had succeeded.

use async_trait::async_trait;
use routes::{RouteMatch, RouteParams};

/// Context passed to a [`Guard`]
#[derive(Debug, Clone, PartialEq)]
pub struct GuardContext {
    /// Path as navigated, including any query or fragment
    pub full_path: String,
    /// Path with query and fragment removed
    pub path: String,
    /// Parameters of the best match
    pub params: Option<RouteParams>,
    /// Best match
    pub route: Option<RouteMatch>,
    /// Every match, most specific first
    pub chain: Vec<RouteMatch>,
}

/// Context passed to a [`Loader`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderContext {
    /// Path with query and fragment removed
    pub path: String,
    /// Parameters of the best match
    pub params: Option<RouteParams>,
    /// Best match
    pub route: Option<RouteMatch>,
    /// Every match, most specific first
    pub chain: Vec<RouteMatch>,
}

impl From<GuardContext> for LoaderContext {
    fn from(ctx: GuardContext) -> Self {
        Self {
            path: ctx.path,
            params: ctx.params,
            route: ctx.route,
            chain: ctx.chain,
        }
    }
}

/// Decision returned by a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Let the navigation stand
    Allow,
    /// Navigate to another path with a redirect
    Redirect(String),
}

/// Navigation guard
#[async_trait]
pub trait Guard: Send + Sync {
    /// Decide whether a committed navigation may stand
    async fn check(&self, ctx: &GuardContext) -> anyhow::Result<GuardOutcome>;
}

/// Data loader, run after the guard allows a navigation
#[async_trait]
pub trait Loader: Send + Sync {
    /// Prefetch data; may return extra parameters for the route
    async fn load(&self, ctx: &LoaderContext) -> anyhow::Result<Option<RouteParams>>;
}
