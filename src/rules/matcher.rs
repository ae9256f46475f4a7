use super::pattern::compile_pattern;
use super::types::{Rule, RuleKind};
use regex::Regex;
use url::Url;

/// True for absolute `http:` / `https:` URLs.
pub fn is_http_url(url: &str) -> bool {
    parse_http_url(url).is_some()
}

/// Host component of `url` including a non-default port, e.g. `example.com:8080`.
pub fn url_host(url: &str) -> Option<String> {
    host_with_port(&Url::parse(url).ok()?)
}

fn parse_http_url(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Picks the single rule that applies to `url`, if any.
///
/// Pure: the same `(rules, url)` pair always yields the same rule.
pub fn resolve<'a>(rules: &'a [Rule], url: &str) -> Option<&'a Rule> {
    CompiledRules::new(rules).pick(url)
}

/// Whether a single rule's predicate holds for `url`. Disabled rules never match.
pub fn rule_matches(rule: &Rule, url: &str) -> bool {
    if !rule.enabled {
        return false;
    }
    let Some(parsed) = parse_http_url(url) else {
        return false;
    };
    Predicate::compile(rule).test(&parsed, host_with_port(&parsed).as_deref())
}

/// Ordering key for the tie-break: kind first, then value length.
fn specificity(rule: &Rule) -> (u8, usize) {
    (rule.kind.rank(), rule.value.chars().count())
}

#[derive(Debug)]
enum Predicate {
    Host(String),
    Pattern(Regex),
    Never,
}

impl Predicate {
    fn compile(rule: &Rule) -> Self {
        if !rule.enabled {
            return Predicate::Never;
        }
        match rule.kind {
            RuleKind::Domain => Predicate::Host(rule.value.clone()),
            RuleKind::Pattern => compile_pattern(&rule.value)
                .map(Predicate::Pattern)
                .unwrap_or(Predicate::Never),
        }
    }

    /// Patterns run against the normalised serialisation, never the raw input.
    fn test(&self, url: &Url, host: Option<&str>) -> bool {
        match self {
            Predicate::Host(value) => host == Some(value.as_str()),
            Predicate::Pattern(re) => re.is_match(url.as_str()),
            Predicate::Never => false,
        }
    }
}

/// A rule set with its patterns compiled once, for repeated lookups.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    entries: Vec<(&'a Rule, Predicate)>,
}

impl<'a> CompiledRules<'a> {
    pub fn new(rules: &'a [Rule]) -> Self {
        let entries = rules
            .iter()
            .map(|rule| (rule, Predicate::compile(rule)))
            .filter(|(_, predicate)| !matches!(predicate, Predicate::Never))
            .collect();
        Self { entries }
    }

    /// Every enabled rule whose predicate holds for `url`, in input order.
    pub fn candidates(&self, url: &str) -> Vec<&'a Rule> {
        let Some(parsed) = parse_http_url(url) else {
            return Vec::new();
        };
        let host = host_with_port(&parsed);
        self.entries
            .iter()
            .filter(|(_, predicate)| predicate.test(&parsed, host.as_deref()))
            .map(|(rule, _)| *rule)
            .collect()
    }

    pub fn pick(&self, url: &str) -> Option<&'a Rule> {
        // Strictly-greater keeps the first of equally specific candidates.
        let mut best: Option<&'a Rule> = None;
        for rule in self.candidates(url) {
            match best {
                Some(current) if specificity(rule) <= specificity(current) => {}
                _ => best = Some(rule),
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = "https://cdn.test/icon.png";

    #[test]
    fn test_domain_exact_match() {
        let rules = vec![Rule::domain("d", "example.com", ICON)];
        assert!(resolve(&rules, "https://example.com/anything").is_some());
        assert!(resolve(&rules, "http://example.com").is_some());
        assert!(resolve(&rules, "https://sub.example.com/").is_none());
    }

    #[test]
    fn test_domain_includes_port() {
        let rules = vec![Rule::domain("d", "localhost:8080", ICON)];
        assert!(resolve(&rules, "http://localhost:8080/").is_some());
        assert!(resolve(&rules, "http://localhost/").is_none());
    }

    #[test]
    fn test_non_http_urls_rejected() {
        let rules = vec![Rule::pattern("p", "*://*/*", ICON), Rule::domain("d", "example.com", ICON)];
        assert!(resolve(&rules, "ftp://example.com/").is_none());
        assert!(resolve(&rules, "chrome://extensions/").is_none());
        assert!(resolve(&rules, "not a url").is_none());
        assert!(resolve(&rules, "/relative/path").is_none());
    }

    #[test]
    fn test_disabled_rule_ignored_but_kept() {
        let rules = vec![Rule::domain("d", "example.com", ICON).disabled()];
        assert!(resolve(&rules, "https://example.com/").is_none());
        assert_eq!(rules.len(), 1);
        assert!(!rule_matches(&rules[0], "https://example.com/"));
    }

    #[test]
    fn test_pattern_outranks_longer_domain() {
        let rules = vec![
            Rule::domain("d", "example.com", ICON),
            Rule::pattern("p", "*://*/*", ICON),
        ];
        assert_eq!(rules[0].value.len(), 11);
        assert_eq!(rules[1].value.len(), 7);
        assert_eq!(resolve(&rules, "https://example.com/").unwrap().id, "p");
    }

    #[test]
    fn test_longer_value_wins_within_kind() {
        let rules = vec![
            Rule::pattern("short", "*://*.example.com/*", ICON),
            Rule::pattern("long", "*://*.example.com/docs/*", ICON),
        ];
        assert_eq!(resolve(&rules, "https://a.example.com/docs/1").unwrap().id, "long");
        assert_eq!(resolve(&rules, "https://a.example.com/blog").unwrap().id, "short");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rules = vec![
            Rule::pattern("first", "https://example.com/*", ICON),
            Rule::pattern("second", "*://example.com/abcd*", ICON),
        ];
        assert_eq!(rules[0].value.len(), rules[1].value.len());
        assert_eq!(resolve(&rules, "https://example.com/abcdef").unwrap().id, "first");
    }

    #[test]
    fn test_malformed_pattern_does_not_abort() {
        let rules = vec![
            Rule::pattern("broken", "no-scheme-here", ICON),
            Rule::domain("d", "example.com", ICON),
        ];
        assert_eq!(resolve(&rules, "https://example.com/").unwrap().id, "d");
        assert_eq!(CompiledRules::new(&rules).len(), 1);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let rules = vec![
            Rule::domain("a", "example.com", ICON),
            Rule::pattern("b", "*://example.com/*", ICON),
            Rule::pattern("c", "https://example.com/*", ICON),
        ];
        let url = "https://example.com/page";
        let first = resolve(&rules, url).map(|r| r.id.clone());
        let second = resolve(&rules, url).map(|r| r.id.clone());
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("c"));
    }

    #[test]
    fn test_subdomain_pattern_ignores_host_text_in_query() {
        let rules = vec![Rule::pattern("p", "*://*.example.com/*", ICON)];
        let url = "https://evil.com?.example.com/";
        assert_eq!(url_host(url).as_deref(), Some("evil.com"));
        assert!(resolve(&rules, url).is_none());
        assert!(!rule_matches(&rules[0], url));
        assert!(resolve(&rules, "https://evil.com#.example.com/").is_none());
    }

    #[test]
    fn test_pattern_matches_normalised_url() {
        let rules = vec![Rule::pattern("p", "*://*.example.com/*", ICON)];
        // No trailing slash.
        assert!(resolve(&rules, "https://a.example.com").is_some());
        // Scheme and host case.
        assert!(resolve(&rules, "HTTPS://A.EXAMPLE.COM/x").is_some());
        assert!(rule_matches(&rules[0], "HTTPS://A.EXAMPLE.COM/x"));
    }

    #[test]
    fn test_candidates_in_input_order() {
        let rules = vec![
            Rule::pattern("p", "*://example.com/*", ICON),
            Rule::domain("x", "other.com", ICON),
            Rule::domain("d", "example.com", ICON),
        ];
        let compiled = CompiledRules::new(&rules);
        let ids: Vec<_> = compiled
            .candidates("https://example.com/")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p", "d"]);
    }
}
