//! Nested view scoping for Pathway
//!
//! Every nesting level of a view hierarchy owns a [`ViewTable`] mapping route
//! names to views. This crate provides:
//!
//! - [`scope`] - per-level scope resolution: which view a level shows, its
//!   scope key, and whether that key changed since the previous route
//! - [`viewer`] - the layer lifecycle an animated presentation follows when
//!   a level's scope key changes, with a reference [`TransitionViewer`] and
//!   a non-animated [`PassthroughViewer`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod scope;
pub mod viewer;

pub use scope::{resolve, resolve_levels, ScopeResolution, View, ViewTable};
pub use viewer::{
    CompletionSignal, Layer, Lifecycle, PassthroughViewer, TransitionViewer, Viewer, ViewerInput,
    DEFAULT_EXIT_TIMEOUT,
};
