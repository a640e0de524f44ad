//! History integration for Pathway
//!
//! This crate binds a [`RouterStore`](router_state::RouterStore) to a host's
//! navigation primitives:
//!
//! - [`host`] - the [`NavigationHost`] seam and an in-memory host
//! - [`location`] - turning raw locations into canonical paths and back
//! - [`hooks`] - optional guard and loader hooks
//! - [`adapter`] - the [`HistoryAdapter`] itself, with session-index
//!   bookkeeping and direction inference

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod error;
pub mod hooks;
pub mod host;
pub mod location;

pub use adapter::{
    AdapterOptions, HistoryAdapter, HistoryAdapterBuilder, ListenerHandle, LoadedParams,
    Navigation, DEFAULT_MAX_REDIRECTS,
};
pub use error::{HistoryError, HostError, Result};
pub use hooks::{Guard, GuardContext, GuardOutcome, Loader, LoaderContext};
pub use host::{EntryState, HostEvent, Location, MemoryHistory, NavigationHost};
pub use location::{normalize, path_from_location, to_url};
