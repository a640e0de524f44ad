//! Pathway - client-side navigation
//!
//! Pathway maps paths to named routes, keeps the current path in a small
//! reactive store, binds that store to a host's session history, and tells
//! nested view levels when their content changed so a presentation layer
//! can animate the change.
//!
//! The pieces live in their own crates and are re-exported here:
//!
//! - [`routes`] - pattern compilation, matching and path building
//! - [`router_state`] - the state store and navigation [`Direction`]
//! - [`history`] - the history adapter, host seam and hooks
//! - [`view_scope`] - per-level scope resolution and viewer lifecycle
//!
//! [`Router`] ties them together, one context per router instance.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod link;
pub mod router;

pub use config::{ConfigError, RouterConfig, DEFAULT_EXIT_TIMEOUT_MS};
pub use error::{Result, RouterError};
pub use link::{Href, LinkClick, Modifiers, MouseButton, MISSING_PARAMS};
pub use router::{Router, RouterBuilder, RouterSnapshot};

pub use history::{
    EntryState, Guard, GuardContext, GuardOutcome, HistoryAdapter, HostEvent, ListenerHandle,
    LoadedParams, Loader, LoaderContext, Location, MemoryHistory, Navigation, NavigationHost,
};
pub use router_state::{ChangeRecord, Direction, NavigationMode, RouterState, RouterStore};
pub use routes::{RouteError, RouteMatch, RouteParams, RoutePattern, RouteTable};
pub use view_scope::{
    CompletionSignal, Layer, Lifecycle, PassthroughViewer, ScopeResolution, TransitionViewer,
    View, ViewTable, Viewer, ViewerInput,
};

pub use history;
pub use router_state;
pub use routes;
pub use view_scope;
