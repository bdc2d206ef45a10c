//! Request path utilities.
//!
//! Joins request paths onto the configured base URL and maps a path to the
//! resource collection it belongs to, which drives cache invalidation.

/// Check if a path is already an absolute http(s) URL
pub fn has_scheme(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join a request path onto the base URL with exactly one slash between them.
///
/// Absolute URLs pass through untouched.
pub fn build_url(base_url: &str, path: &str) -> String {
    if has_scheme(path) {
        return path.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }

    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Drop the query string and fragment from a path
pub fn strip_query(path: &str) -> &str {
    path.split(|c| c == '?' || c == '#').next().unwrap_or(path)
}

/// Resource collection a path belongs to: its first segment.
///
/// `/models/7?x=1` and `/models` both belong to `/models`. Absolute URLs are
/// reduced to their path first.
pub fn collection_of(path: &str) -> String {
    let path = if has_scheme(path) {
        let after_scheme = path.splitn(2, "://").nth(1).unwrap_or("");
        after_scheme.find('/').map_or("", |i| &after_scheme[i..])
    } else {
        path
    };

    let first = strip_query(path)
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("");
    format!("/{}", first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let base = "http://localhost:3000/api/v1";
        assert_eq!(build_url(base, "/clients"), "http://localhost:3000/api/v1/clients");
        assert_eq!(build_url(base, "clients"), "http://localhost:3000/api/v1/clients");
        assert_eq!(
            build_url("http://localhost:3000/api/v1/", "/clients"),
            "http://localhost:3000/api/v1/clients"
        );
        assert_eq!(build_url(base, ""), "http://localhost:3000/api/v1");
    }

    #[test]
    fn test_build_url_passthrough() {
        let url = "https://files.qryti.com/reports/1.pdf";
        assert_eq!(build_url("http://localhost", url), url);
        assert_eq!(build_url("http://localhost", "HTTP://x"), "HTTP://x");
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://a"));
        assert!(has_scheme("http://a"));
        assert!(!has_scheme("/http/thing"));
        assert!(!has_scheme("ht"));
    }

    #[test]
    fn test_collection_of() {
        assert_eq!(collection_of("/models"), "/models");
        assert_eq!(collection_of("/models/7"), "/models");
        assert_eq!(collection_of("models/7?x=1"), "/models");
        assert_eq!(collection_of("/models?status=Active"), "/models");
        assert_eq!(collection_of("/"), "/");
        assert_eq!(collection_of("https://api.qryti.com/clients/3"), "/clients");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/a/b?c=d"), "/a/b");
        assert_eq!(strip_query("/a#frag"), "/a");
        assert_eq!(strip_query("/a"), "/a");
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn collection_ignores_subpath_and_query(
                collection in "[a-z][a-z_]{0,12}",
                rest in "(/[a-z0-9]{1,8}){0,3}",
                query in "(\\?[a-z]{1,5}=[a-z0-9]{0,5})?",
            ) {
                let path = format!("/{}{}{}", collection, rest, query);
                prop_assert_eq!(collection_of(&path), format!("/{}", collection));
            }

            #[test]
            fn build_url_has_single_separator(
                base in "http://[a-z]{1,8}(/[a-z0-9]{1,4}){0,2}/?",
                path in "/?[a-z]{1,8}",
            ) {
                let url = build_url(&base, &path);
                let joined = url.trim_start_matches("http://");
                prop_assert!(!joined.contains("//"));
                prop_assert!(url.ends_with(path.trim_start_matches('/')));
            }
        }
    }
}
