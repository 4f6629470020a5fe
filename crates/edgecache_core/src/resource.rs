//! Resource-identifier extraction.
//!
//! A request names its resource either with a `file` query parameter or with
//! the path remainder after the literal `/data/` prefix. The query parameter
//! wins regardless of the path; an empty `file` value falls back to the
//! path, matching how a missing parameter behaves.

/// Split a request target into path and optional raw query string.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// First value of a query parameter, if present.
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}

/// Derive the resource identifier from a request target, or None when the
/// request addresses nothing servable.
pub fn resource_identifier(target: &str) -> Option<&str> {
    let (path, query) = split_target(target);

    if let Some(query) = query {
        if let Some(file) = query_param(query, "file") {
            if !file.is_empty() {
                return Some(file);
            }
        }
    }

    path.strip_prefix("/data/").filter(|rest| !rest.is_empty())
}
