//! Location normalization
//!
//! In path mode the canonical path is pathname + search + hash with the base
//! prefix removed. In hash mode it is the fragment, and the base is only used
//! when writing URLs.

use crate::host::Location;

/// Canonicalize a raw path: ensure a leading `/` and strip `base`
///
/// The base is only stripped at a segment boundary, so base `/app` leaves
/// `/apple` untouched.
pub fn normalize(path: &str, base: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if base.is_empty() {
        return path;
    }

    match path.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        Some(rest) if rest.starts_with('?') || rest.starts_with('#') => format!("/{}", rest),
        _ => path,
    }
}

/// URL to write to the host for a canonical path
pub fn to_url(path: &str, base: &str, use_hash: bool) -> String {
    if use_hash {
        format!("{}#{}", base, path)
    } else {
        format!("{}{}", base, path)
    }
}

/// Canonical path for a raw host location
pub fn path_from_location(location: &Location, base: &str, use_hash: bool) -> String {
    if use_hash {
        let raw = location.hash.strip_prefix('#').unwrap_or(&location.hash);
        let raw = if raw.is_empty() { "/" } else { raw };
        return normalize(raw, "");
    }
    normalize(&location.href(), base)
}
