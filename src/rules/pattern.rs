use regex::Regex;

/// Compiles a `scheme://host/path` match pattern into a regex anchored at both
/// ends of the URL string.
///
/// * scheme: `*` (http or https) or a literal scheme
/// * host: `*` (any host), `*.suffix` (one or more labels in front of
///   `suffix`, never the bare suffix) or a literal host whose `*` labels match
///   exactly one label
/// * path: `*` matches any run of characters, everything else is literal
///
/// Returns `None` for anything that does not have that shape.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    let (scheme, rest) = pattern.split_once("://")?;
    let (host, path) = rest.split_once('/')?;

    let scheme_part = compile_scheme(scheme)?;
    let host_part = compile_host(host)?;
    let path_part = compile_path(path);

    Regex::new(&format!("^{}://{}/{}$", scheme_part, host_part, path_part)).ok()
}

fn compile_scheme(scheme: &str) -> Option<String> {
    if scheme == "*" {
        return Some("(?:http|https)".to_string());
    }
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| regex::escape(scheme))
}

fn compile_host(host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }
    if host == "*" {
        return Some("[^/]+".to_string());
    }
    if let Some(suffix) = host.strip_prefix("*.") {
        if suffix.is_empty() || suffix.contains('*') {
            return None;
        }
        return Some(format!(r"(?:[^./]+\.)+{}", regex::escape(suffix)));
    }
    let labels: Vec<String> = host
        .split('.')
        .map(|label| {
            if label == "*" {
                "[^./]+".to_string()
            } else {
                regex::escape(label)
            }
        })
        .collect();
    Some(labels.join(r"\."))
}

fn compile_path(path: &str) -> String {
    path.split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, url: &str) -> bool {
        compile_pattern(pattern).is_some_and(|re| re.is_match(url))
    }

    #[test]
    fn test_any_scheme() {
        assert!(matches("*://example.com/*", "http://example.com/"));
        assert!(matches("*://example.com/*", "https://example.com/a/b"));
        assert!(!matches("*://example.com/*", "ftp://example.com/"));
    }

    #[test]
    fn test_literal_scheme() {
        assert!(matches("https://example.com/*", "https://example.com/x"));
        assert!(!matches("https://example.com/*", "http://example.com/x"));
    }

    #[test]
    fn test_subdomain_wildcard_excludes_bare_host() {
        assert!(matches("*://*.example.com/*", "https://a.example.com/x"));
        assert!(matches("*://*.example.com/*", "https://a.b.example.com/"));
        assert!(!matches("*://*.example.com/*", "http://example.com/"));
        assert!(!matches("*://*.example.com/*", "https://badexample.com/"));
    }

    #[test]
    fn test_any_host() {
        assert!(matches("https://*/favicon/*", "https://anything.test/favicon/x"));
        assert!(!matches("https://*/favicon/*", "https://anything.test/other"));
    }

    #[test]
    fn test_path_is_literal_except_star() {
        assert!(matches("https://example.com/a.b?c=1", "https://example.com/a.b?c=1"));
        assert!(!matches("https://example.com/a.b", "https://example.com/aXb"));
        assert!(matches("https://example.com/docs/*/edit", "https://example.com/docs/42/edit"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!matches("https://example.com/a", "https://example.com/a/b"));
        assert!(!matches("https://example.com/a", "xhttps://example.com/a"));
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(compile_pattern("example.com").is_none());
        assert!(compile_pattern("*://example.com").is_none());
        assert!(compile_pattern("*:///path").is_none());
        assert!(compile_pattern("1http://example.com/").is_none());
        assert!(compile_pattern("*://*./").is_none());
    }
}
