use log::debug;
use url::Url;

/// Base used to resolve relative paths and locations so both are compared the same way
const NEUTRAL_BASE: &str = "http://localhost/";

/// Trim trailing slashes from a path or endpoint
pub fn trim_trailing_slash(path: impl Into<String>) -> String {
    let path = path.into();
    if path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        debug!("Stripped trailing '/' from {:?} -> {:?}", path, trimmed);
        trimmed
    } else {
        path
    }
}

/// Join the target base path with a rewritten request path-and-query.
/// An empty result collapses to `/`.
pub fn join_paths(base: &str, path_and_query: &str) -> String {
    let base = base.trim_end_matches('/');
    let joined = if path_and_query.is_empty() || path_and_query.starts_with('?') {
        format!("{base}/{path_and_query}")
    } else if path_and_query.starts_with('/') {
        format!("{base}{path_and_query}")
    } else {
        format!("{base}/{path_and_query}")
    };
    if joined.starts_with('/') { joined } else { format!("/{joined}") }
}

/// Path component of a URL, absolute path or relative reference, resolved against a neutral base
pub fn resolve_path(reference: &str) -> String {
    match Url::parse(NEUTRAL_BASE).and_then(|base| base.join(reference)) {
        Ok(url) => url.path().to_string(),
        Err(_) => reference.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_trailing_slash_with_slash() {
        assert_eq!(trim_trailing_slash("/bff/api/"), "/bff/api");
        assert_eq!(trim_trailing_slash("https://backend.example/shop//"), "https://backend.example/shop");
        assert_eq!(trim_trailing_slash("/"), "");
    }

    #[test]
    fn test_trim_trailing_slash_without_slash() {
        assert_eq!(trim_trailing_slash("/bff/api"), "/bff/api");
        assert_eq!(trim_trailing_slash(""), "");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/cart"), "/cart");
        assert_eq!(join_paths("/", "/cart"), "/cart");
        assert_eq!(join_paths("/shop", "/cart?x=1"), "/shop/cart?x=1");
        assert_eq!(join_paths("/shop/", "cart"), "/shop/cart");
        assert_eq!(join_paths("/shop", ""), "/shop/");
        assert_eq!(join_paths("", ""), "/");
        assert_eq!(join_paths("", "?page=2"), "/?page=2");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("https://backend.example/site/cart?x=1"), "/site/cart");
        assert_eq!(resolve_path("/bff/api/purchase/12345"), "/bff/api/purchase/12345");
        assert_eq!(resolve_path("site/logout"), "/site/logout");
        assert_eq!(resolve_path(""), "/");
    }
}
