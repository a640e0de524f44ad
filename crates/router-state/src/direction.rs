//! Navigation direction
//!
//! Programmatic push is always forward and programmatic replace/redirect is
//! always a replace. Host back/forward navigation compares the session index
//! of the landed entry with the last observed one.

use crate::store::NavigationMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a navigation, as seen by presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Moving deeper into history
    #[default]
    Forward,
    /// Moving back through history
    Back,
    /// Same position in history
    Replace,
}

impl Direction {
    /// Direction for a pop, from the previous and newly read session indices
    pub fn from_indices(previous: Option<u64>, current: Option<u64>) -> Self {
        match (previous, current) {
            (Some(prev), Some(curr)) if curr < prev => Direction::Back,
            (Some(prev), Some(curr)) if curr > prev => Direction::Forward,
            _ => Direction::Replace,
        }
    }

    /// Direction for a transition of the given mode
    ///
    /// The indices are only consulted for [`NavigationMode::Pop`].
    pub fn infer(mode: NavigationMode, previous: Option<u64>, current: Option<u64>) -> Self {
        match mode {
            NavigationMode::Push => Direction::Forward,
            NavigationMode::Replace | NavigationMode::Redirect => Direction::Replace,
            NavigationMode::Pop => Self::from_indices(previous, current),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Replace => "replace",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programmatic_modes() {
        assert_eq!(Direction::infer(NavigationMode::Push, Some(5), Some(1)), Direction::Forward);
        assert_eq!(Direction::infer(NavigationMode::Replace, Some(1), Some(5)), Direction::Replace);
        assert_eq!(Direction::infer(NavigationMode::Redirect, None, None), Direction::Replace);
    }

    #[test]
    fn test_pop_compares_indices() {
        assert_eq!(Direction::infer(NavigationMode::Pop, Some(2), Some(1)), Direction::Back);
        assert_eq!(Direction::infer(NavigationMode::Pop, Some(1), Some(2)), Direction::Forward);
        assert_eq!(Direction::infer(NavigationMode::Pop, Some(2), Some(2)), Direction::Replace);
    }

    #[test]
    fn test_pop_without_index_is_replace() {
        assert_eq!(Direction::from_indices(None, Some(3)), Direction::Replace);
        assert_eq!(Direction::from_indices(Some(3), None), Direction::Replace);
    }
}
