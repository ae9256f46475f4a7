use favicon_pin::rules::{compile_pattern, import_rules, resolve, CompiledRules, Rule, RuleKind};

const ICON: &str = "https://cdn.test/icon.png";

#[test]
fn test_wildcard_subdomain_boundary() {
    let rules = vec![Rule::pattern("p", "*://*.example.com/*", ICON)];
    assert!(resolve(&rules, "https://a.example.com/x").is_some());
    assert!(resolve(&rules, "http://example.com/").is_none());
}

#[test]
fn test_domain_rule_boundary() {
    let rules = vec![Rule::domain("d", "example.com", ICON)];
    assert!(resolve(&rules, "https://example.com/anything").is_some());
    assert!(resolve(&rules, "https://sub.example.com/").is_none());
}

#[test]
fn test_pattern_beats_domain_regardless_of_length() {
    let domain = Rule::domain("d", "example.com", ICON);
    let pattern = Rule::pattern("p", "*://*/", ICON);
    assert!(pattern.value.len() < domain.value.len());
    assert!(compile_pattern(&pattern.value).is_some());

    let rules = vec![domain, pattern];
    assert_eq!(resolve(&rules, "https://example.com/").unwrap().id, "p");
}

#[test]
fn test_resolve_is_pure() {
    let rules = import_rules(
        r#"[
            {"id": "1", "type": "domain", "value": "docs.example.com", "faviconUrl": "data:1"},
            {"id": "2", "type": "pattern", "value": "https://docs.example.com/*", "faviconUrl": "data:2"},
            {"id": "3", "type": "pattern", "value": "*://*.example.com/*", "faviconUrl": "data:3", "enabled": false},
            {"id": "4", "type": "pattern", "value": "broken", "faviconUrl": "data:4"}
        ]"#,
    )
    .unwrap();
    let before = rules.clone();

    let urls = [
        "https://docs.example.com/guide",
        "http://docs.example.com/",
        "https://www.example.com/",
        "mailto:someone@example.com",
    ];
    for url in urls {
        let first = resolve(&rules, url).map(|r| r.id.clone());
        let second = resolve(&rules, url).map(|r| r.id.clone());
        assert_eq!(first, second, "{}", url);
    }
    assert_eq!(rules, before);

    assert_eq!(resolve(&rules, urls[0]).unwrap().id, "2");
    assert_eq!(resolve(&rules, urls[1]).unwrap().id, "1");
    assert!(resolve(&rules, urls[2]).is_none());
    assert!(resolve(&rules, urls[3]).is_none());
}

#[test]
fn test_compiled_rules_match_free_function() {
    let rules = vec![
        Rule::domain("a", "example.com", ICON),
        Rule::pattern("b", "*://example.com/*", ICON).disabled(),
        Rule::new("c", RuleKind::Pattern, "https://example.com/a/*", ICON),
    ];
    let compiled = CompiledRules::new(&rules);
    assert_eq!(compiled.len(), 2);
    for url in ["https://example.com/", "https://example.com/a/b", "https://x.test/"] {
        assert_eq!(
            compiled.pick(url).map(|r| &r.id),
            resolve(&rules, url).map(|r| &r.id)
        );
    }
}
