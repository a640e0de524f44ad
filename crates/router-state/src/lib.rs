//! Router state for Pathway
//!
//! This crate provides the minimal reactive state store behind a router: the
//! current path, four named transitions, change records for subscribers, and the rule
//! that turns a transition into a navigation [`Direction`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod direction;
pub mod store;

pub use direction::Direction;
pub use store::{ChangeRecord, NavigationMode, RouterState, RouterStore};
