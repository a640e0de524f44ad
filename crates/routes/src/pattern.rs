//! Pattern compilation
//!
//! A pattern such as `/products/:id/specs` compiles into an ordered list of
//! [`PatternSegment`]s. Matching is a full-string match: the path must start
//! with `/` and have exactly as many segments as the pattern.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for a route
pub type RouteParams = HashMap<String, String>;

/// Result of matching a path against a named route
///
/// Produced fresh on every resolution. Parameter values are always strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Route name
    pub name: String,
    /// The path that was matched
    pub path: String,
    /// Captured parameters, URL-decoded
    pub params: RouteParams,
}

impl RouteMatch {
    /// Get a captured parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Segment type in a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Literal segment
    Literal(String),
    /// Parameter segment
    Param(String),
}

/// A compiled route pattern
///
/// Immutable once compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    name: String,
    pattern: String,
    segments: Vec<PatternSegment>,
    param_names: Vec<String>,
}

impl RoutePattern {
    /// Compile a pattern string for the given route name
    pub fn compile(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let pattern = pattern.into();

        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern,
                reason: "pattern must start with '/'".to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(param) = part.strip_prefix(':') {
                if param.is_empty() || !param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(RouteError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: format!("invalid parameter name ':{}'", param),
                    });
                }
                if param_names.iter().any(|p| p == param) {
                    return Err(RouteError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: format!("parameter ':{}' appears twice", param),
                    });
                }
                param_names.push(param.to_string());
                segments.push(PatternSegment::Param(param.to_string()));
            } else {
                segments.push(PatternSegment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            name,
            pattern,
            segments,
            param_names,
        })
    }

    /// Route name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Compiled segments
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Ranking used to order competing matches
    ///
    /// `static * 1000 - params * 10 + pattern length`: more literal segments
    /// win, then fewer parameters, then longer patterns.
    pub fn specificity(&self) -> i64 {
        let params = self.param_names.len() as i64;
        let statics = self.segments.len() as i64 - params;
        statics * 1000 - params * 10 + self.pattern.len() as i64
    }

    /// Match a path, returning the decoded parameters
    ///
    /// Returns `None` if the path does not match in full or if a captured
    /// segment is not valid percent-encoding.
    pub fn captures(&self, path: &str) -> Option<RouteParams> {
        let rest = path.strip_prefix('/')?;

        if self.segments.is_empty() {
            return rest.is_empty().then(RouteParams::new);
        }

        let mut params = RouteParams::with_capacity(self.param_names.len());
        let mut parts = rest.split('/');

        for segment in &self.segments {
            let actual = parts.next()?;
            match segment {
                PatternSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PatternSegment::Param(name) => {
                    if actual.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), urlencoding::decode(actual).ok()?.into_owned());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }

    /// Match a path, producing a [`RouteMatch`]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.captures(path).map(|params| RouteMatch {
            name: self.name.clone(),
            path: path.to_string(),
            params,
        })
    }

    /// Build a path by substituting every `:param` with its encoded value
    pub fn build(&self, params: &RouteParams) -> Result<String> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::with_capacity(self.pattern.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                PatternSegment::Literal(lit) => path.push_str(lit),
                PatternSegment::Param(name) => {
                    let value = params.get(name).ok_or_else(|| RouteError::MissingParam {
                        param: name.clone(),
                        pattern: self.pattern.clone(),
                    })?;
                    path.push_str(&urlencoding::encode(value));
                }
            }
        }
        Ok(path)
    }
}

/// Remove any `?query` and `#fragment` from a path
///
/// An empty remainder becomes `/`.
pub fn strip_query_hash(path: &str) -> &str {
    let end = path.find(|c| c == '?' || c == '#').unwrap_or(path.len());
    match &path[..end] {
        "" => "/",
        stripped => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compile_segments() {
        let p = RoutePattern::compile("ProductSpecs", "/products/:id/specs").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PatternSegment::Literal("products".to_string()),
                PatternSegment::Param("id".to_string()),
                PatternSegment::Literal("specs".to_string()),
            ]
        );
        assert_eq!(p.param_names(), &["id".to_string()]);
    }

    #[test]
    fn test_root_matches_only_root() {
        let p = RoutePattern::compile("Home", "/").unwrap();
        assert_eq!(p.captures("/"), Some(RouteParams::new()));
        assert_eq!(p.captures("/about"), None);
        assert_eq!(p.captures(""), None);
    }

    #[test]
    fn test_full_string_match() {
        let p = RoutePattern::compile("Users", "/users").unwrap();
        assert!(p.captures("/users").is_some());
        assert!(p.captures("/users/").is_none());
        assert!(p.captures("/users/1").is_none());
        assert!(p.captures("/xusers").is_none());
        assert!(p.captures("users").is_none());
    }

    #[test]
    fn test_param_captures_single_segment() {
        let p = RoutePattern::compile("User", "/users/:userId").unwrap();
        assert_eq!(p.captures("/users/7"), Some(params(&[("userId", "7")])));
        assert_eq!(p.captures("/users/7/edit"), None);
        assert_eq!(p.captures("/users/"), None);
    }

    #[test]
    fn test_captures_are_url_decoded() {
        let p = RoutePattern::compile("Tag", "/tags/:tag").unwrap();
        assert_eq!(
            p.captures("/tags/hello%20world"),
            Some(params(&[("tag", "hello world")]))
        );
    }

    #[test]
    fn test_invalid_percent_encoding_does_not_match() {
        let p = RoutePattern::compile("Tag", "/tags/:tag").unwrap();
        assert_eq!(p.captures("/tags/%FF"), None);
    }

    #[test]
    fn test_literal_segments_are_not_patterns() {
        let p = RoutePattern::compile("Dots", "/a.b/c+d").unwrap();
        assert!(p.captures("/a.b/c+d").is_some());
        assert!(p.captures("/axb/c+d").is_none());
    }

    #[test]
    fn test_build_encodes_values() {
        let p = RoutePattern::compile("Tag", "/tags/:tag").unwrap();
        assert_eq!(
            p.build(&params(&[("tag", "hello world")])).unwrap(),
            "/tags/hello%20world"
        );
    }

    #[test]
    fn test_build_missing_param() {
        let p = RoutePattern::compile("UserDetail", "/users/:userId").unwrap();
        let err = p.build(&RouteParams::new()).unwrap_err();
        assert_eq!(
            err,
            RouteError::MissingParam {
                param: "userId".to_string(),
                pattern: "/users/:userId".to_string(),
            }
        );
    }

    #[test]
    fn test_build_ignores_extra_params() {
        let p = RoutePattern::compile("About", "/about").unwrap();
        assert_eq!(p.build(&params(&[("x", "1")])).unwrap(), "/about");
    }

    #[test]
    fn test_round_trip_with_reserved_characters() {
        let p = RoutePattern::compile("Post", "/profile/:name/post/:rkey").unwrap();
        let input = params(&[("name", "alice/bob?x#y"), ("rkey", "ünï cødé")]);
        let path = p.build(&input).unwrap();
        assert_eq!(p.captures(&path), Some(input));
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        assert!(matches!(
            RoutePattern::compile("A", "users"),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("B", "/users/:"),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("C", "/:id/x/:id"),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_specificity_score() {
        let literal = RoutePattern::compile("NewUser", "/users/new").unwrap();
        let param = RoutePattern::compile("User", "/users/:id").unwrap();
        assert_eq!(literal.specificity(), 2000 + 10);
        assert_eq!(param.specificity(), 1000 - 10 + 10);
        assert!(literal.specificity() > param.specificity());
    }

    #[test]
    fn test_strip_query_hash() {
        assert_eq!(strip_query_hash("/a/b?x=1#top"), "/a/b");
        assert_eq!(strip_query_hash("/a#top?x"), "/a");
        assert_eq!(strip_query_hash("?x=1"), "/");
        assert_eq!(strip_query_hash("/plain"), "/plain");
    }
}
