use anyhow::Result;
use async_trait::async_trait;
use favicon_pin::config::EnforcementConfig;
use favicon_pin::controller::{Controller, ICON_RELS};
use favicon_pin::dom::{Document, LinkSpec, MemoryPage};
use favicon_pin::orchestrator::{NavigationOutcome, Orchestrator};
use favicon_pin::rules::Rule;
use favicon_pin::scheduler::ManualScheduler;
use favicon_pin::store::{upsert_rule, MemoryRuleStore, RuleDraft, RuleStore};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct FailingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl RuleStore for FailingStore {
    async fn get(&self) -> Result<Vec<Rule>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("storage offline"))
    }

    async fn set(&self, _rules: Vec<Rule>) -> Result<()> {
        Err(anyhow::anyhow!("storage offline"))
    }
}

fn tab(url: &str) -> (Rc<MemoryPage>, Controller) {
    let page = Rc::new(MemoryPage::new(url));
    let controller = Controller::new(
        page.clone(),
        page.clone(),
        Rc::new(ManualScheduler::new()),
        EnforcementConfig::default(),
    );
    (page, controller)
}

#[tokio::test]
async fn test_navigation_applies_best_rule() {
    let store = Arc::new(MemoryRuleStore::new(vec![
        Rule::domain("domain", "app.example.com", "https://cdn.test/domain.png"),
        Rule::pattern("pattern", "*://*.example.com/*", "https://cdn.test/pattern.png"),
    ]));
    let orchestrator = Orchestrator::new(store);
    let (page, controller) = tab("https://app.example.com/inbox");
    page.append_link(&LinkSpec::new("icon", "/favicon.ico")).unwrap();

    let outcome = orchestrator
        .on_navigation_completed(&controller, "https://app.example.com/inbox")
        .await;

    match outcome {
        NavigationOutcome::Applied(rule) => assert_eq!(rule.id, "pattern"),
        other => panic!("unexpected outcome {:?}", other),
    }
    let links = page.icon_links().unwrap();
    assert_eq!(links.len(), ICON_RELS.len());
    assert!(links.iter().all(|l| l.href == "https://cdn.test/pattern.png"));
}

#[tokio::test]
async fn test_no_match_leaves_page_alone() {
    let store = Arc::new(MemoryRuleStore::new(vec![Rule::domain(
        "d",
        "example.com",
        "https://cdn.test/i.png",
    )]));
    let orchestrator = Orchestrator::new(store);
    let (page, controller) = tab("https://other.test/");
    page.append_link(&LinkSpec::new("icon", "/favicon.ico")).unwrap();

    let outcome = orchestrator
        .on_navigation_completed(&controller, "https://other.test/")
        .await;

    assert_eq!(outcome, NavigationOutcome::NoMatch);
    assert_eq!(page.icon_links().unwrap().len(), 1);
    assert!(!controller.snapshot().observer_active);
}

#[tokio::test]
async fn test_non_http_pages_skipped() {
    let store = Arc::new(FailingStore {
        calls: AtomicUsize::new(0),
    });
    let orchestrator = Orchestrator::new(store.clone());
    let (_, controller) = tab("chrome://settings/");

    let outcome = orchestrator
        .on_navigation_completed(&controller, "chrome://settings/")
        .await;

    assert_eq!(outcome, NavigationOutcome::Skipped);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failure_is_swallowed() {
    let orchestrator = Orchestrator::new(Arc::new(FailingStore {
        calls: AtomicUsize::new(0),
    }));
    let (page, controller) = tab("https://example.com/");

    let outcome = orchestrator
        .on_navigation_completed(&controller, "https://example.com/")
        .await;

    assert_eq!(outcome, NavigationOutcome::StoreUnavailable);
    assert!(page.icon_links().unwrap().is_empty());
    assert!(orchestrator.lookup("https://example.com/").await.is_none());
}

#[tokio::test]
async fn test_invalid_favicon_is_not_applied() {
    let store = Arc::new(MemoryRuleStore::new(vec![Rule::domain(
        "d",
        "example.com",
        "javascript:alert(1)",
    )]));
    let orchestrator = Orchestrator::new(store);
    let (page, controller) = tab("https://example.com/");

    let outcome = orchestrator
        .on_navigation_completed(&controller, "https://example.com/")
        .await;

    assert!(matches!(outcome, NavigationOutcome::InvalidFavicon(_)));
    assert!(page.icon_links().unwrap().is_empty());
}

#[tokio::test]
async fn test_disabling_rule_keeps_it_stored() {
    let store = Arc::new(MemoryRuleStore::new(vec![Rule::domain(
        "d",
        "example.com",
        "https://cdn.test/i.png",
    )]));
    let orchestrator = Orchestrator::new(store.clone());
    assert!(orchestrator.lookup("https://example.com/").await.is_some());

    upsert_rule(
        store.as_ref(),
        RuleDraft::new(
            favicon_pin::rules::RuleKind::Domain,
            "example.com",
            "https://cdn.test/i.png",
        )
        .with_id("d")
        .enabled(false),
    )
    .await
    .unwrap();

    assert!(orchestrator.lookup("https://example.com/").await.is_none());
    let stored = store.get().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].enabled);
}

#[tokio::test]
async fn test_clear_through_orchestrator() {
    let store = Arc::new(MemoryRuleStore::new(vec![Rule::domain(
        "d",
        "example.com",
        "https://cdn.test/i.png",
    )]));
    let orchestrator = Orchestrator::new(store);
    let (page, controller) = tab("https://example.com/");

    orchestrator
        .on_navigation_completed(&controller, "https://example.com/")
        .await;
    page.append_link(&LinkSpec::new("icon", "/own.ico")).unwrap();
    orchestrator.clear(&controller);

    let links = page.icon_links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href, "https://example.com/own.ico");
}
