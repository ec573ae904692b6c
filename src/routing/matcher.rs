//! Route matching module
//!
//! Implements path, method and header matching for exec routes.

use hyper::{HeaderMap, Method};

use crate::config::{HeaderMatcher, RouteMatch};

/// Find the first route whose rule accepts the request
pub fn match_route<'a, T>(
    path: &str,
    method: &Method,
    headers: &HeaderMap,
    routes: &'a [T],
    rule_of: impl Fn(&T) -> &RouteMatch,
) -> Option<&'a T> {
    routes
        .iter()
        .find(|route| matches_route_rule(rule_of(route), path, method, headers))
}

/// Check if a path matches a route rule
pub fn match_path(rule: &RouteMatch, path: &str) -> bool {
    // Exact path match takes priority
    if let Some(exact) = &rule.path {
        return path == exact;
    }

    // Prefix match
    if let Some(prefix) = &rule.prefix {
        return path.starts_with(prefix);
    }

    // No path rule means match all
    true
}

/// Check the method against the allowed list; no list allows every method
fn match_method(rule: &RouteMatch, method: &Method) -> bool {
    rule.methods.as_ref().map_or(true, |methods| {
        methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    })
}

/// Check if request matches a route rule (path + method + headers)
fn matches_route_rule(rule: &RouteMatch, path: &str, method: &Method, headers: &HeaderMap) -> bool {
    if !match_path(rule, path) || !match_method(rule, method) {
        return false;
    }

    rule.headers
        .as_ref()
        .map_or(true, |matchers| match_headers(matchers, headers))
}

/// Check if headers match all header matchers
fn match_headers(matchers: &[HeaderMatcher], headers: &HeaderMap) -> bool {
    matchers.iter().all(|m| match_single_header(m, headers))
}

/// Check if a single header matcher is satisfied
fn match_single_header(matcher: &HeaderMatcher, headers: &HeaderMap) -> bool {
    let header_value = headers
        .get(matcher.name.as_str())
        .and_then(|v| v.to_str().ok());

    // Check "present" condition
    if let Some(should_present) = matcher.present {
        if header_value.is_some() != should_present {
            return false;
        }
        // If we only check presence, we're done
        if matcher.exact.is_none() && matcher.prefix.is_none() {
            return true;
        }
    }

    let Some(value) = header_value else {
        return false;
    };

    if let Some(exact) = &matcher.exact {
        return value == exact;
    }
    if let Some(prefix) = &matcher.prefix {
        return value.starts_with(prefix.as_str());
    }

    // Name only: header must exist
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(prefix: Option<&str>, path: Option<&str>) -> RouteMatch {
        RouteMatch {
            prefix: prefix.map(String::from),
            path: path.map(String::from),
            methods: None,
            headers: None,
        }
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, value.parse().unwrap());
        }
        map
    }

    fn find<'a>(path: &str, method: &Method, routes: &'a [RouteMatch]) -> Option<&'a RouteMatch> {
        match_route(path, method, &HeaderMap::new(), routes, |r| r)
    }

    #[test]
    fn test_match_path_exact() {
        let r = rule(None, Some("/run"));
        assert!(match_path(&r, "/run"));
        assert!(!match_path(&r, "/run/more"));
        assert!(!match_path(&r, "/"));
    }

    #[test]
    fn test_match_path_prefix() {
        let r = rule(Some("/hooks"), None);
        assert!(match_path(&r, "/hooks"));
        assert!(match_path(&r, "/hooks/deploy"));
        assert!(!match_path(&r, "/other"));
    }

    #[test]
    fn test_match_path_catch_all() {
        assert!(match_path(&rule(None, None), "/anything"));
    }

    #[test]
    fn test_match_route_order() {
        let routes = vec![
            rule(Some("/hooks/deploy"), None),
            rule(Some("/hooks"), None),
            rule(None, None), // catch-all
        ];

        let result = find("/hooks/deploy/now", &Method::POST, &routes).unwrap();
        assert_eq!(result.prefix.as_deref(), Some("/hooks/deploy"));

        let result = find("/hooks/build", &Method::POST, &routes).unwrap();
        assert_eq!(result.prefix.as_deref(), Some("/hooks"));

        let result = find("/", &Method::GET, &routes).unwrap();
        assert!(result.prefix.is_none());
    }

    #[test]
    fn test_match_methods() {
        let mut r = rule(None, Some("/run"));
        r.methods = Some(vec!["post".to_string(), "PUT".to_string()]);
        let routes = vec![r];

        assert!(find("/run", &Method::POST, &routes).is_some());
        assert!(find("/run", &Method::PUT, &routes).is_some());
        assert!(find("/run", &Method::GET, &routes).is_none());
    }

    #[test]
    fn test_any_method_without_list() {
        let routes = vec![rule(None, Some("/run"))];
        for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH] {
            assert!(find("/run", &method, &routes).is_some());
        }
    }

    #[test]
    fn test_match_headers() {
        let matchers = vec![HeaderMatcher {
            name: "X-Api-Key".to_string(),
            exact: Some("secret".to_string()),
            prefix: None,
            present: None,
        }];

        assert!(match_headers(&matchers, &headers(&[("x-api-key", "secret")])));
        assert!(!match_headers(&matchers, &headers(&[("x-api-key", "wrong")])));
        assert!(!match_headers(&matchers, &HeaderMap::new()));
    }

    #[test]
    fn test_match_header_present() {
        let matchers = vec![HeaderMatcher {
            name: "Authorization".to_string(),
            exact: None,
            prefix: None,
            present: Some(true),
        }];

        assert!(match_headers(
            &matchers,
            &headers(&[("authorization", "Bearer token")])
        ));
        assert!(!match_headers(&matchers, &HeaderMap::new()));
    }

    #[test]
    fn test_match_header_prefix() {
        let matchers = vec![HeaderMatcher {
            name: "User-Agent".to_string(),
            exact: None,
            prefix: Some("GitHub-Hookshot/".to_string()),
            present: None,
        }];

        assert!(match_headers(
            &matchers,
            &headers(&[("user-agent", "GitHub-Hookshot/abc")])
        ));
        assert!(!match_headers(&matchers, &headers(&[("user-agent", "curl/8.0")])));
    }
}
