//! Route patterns for Pathway
//!
//! This crate compiles named path patterns into matchers and holds them in a
//! [`RouteTable`] that can match paths and build paths back from parameters.
//!
//! # Pattern Syntax
//!
//! - `/` is the root
//! - Literal segments match verbatim (`/products`)
//! - `:name` captures exactly one path segment (`/products/:id`)
//! - No wildcards
//!
//! # Example
//!
//! ```rust
//! use routes::{RouteParams, RouteTable};
//!
//! let table = RouteTable::new([
//!     ("Users", "/users"),
//!     ("User", "/users/:userId"),
//!     ("NewUser", "/users/new"),
//! ])
//! .unwrap();
//!
//! let best = table.match_path("/users/new").unwrap();
//! assert_eq!(best.name, "NewUser");
//!
//! let mut params = RouteParams::new();
//! params.insert("userId".to_string(), "42".to_string());
//! assert_eq!(table.build_path("User", &params).unwrap(), "/users/42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod pattern;
pub mod table;

pub use error::{Result, RouteError};
pub use pattern::{strip_query_hash, PatternSegment, RouteMatch, RouteParams, RoutePattern};
pub use table::RouteTable;
