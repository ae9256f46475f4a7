use crate::controller::Controller;
use crate::rules::{is_http_url, is_valid_favicon_url, resolve, Rule};
use crate::store::RuleStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a navigation-completed event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The URL is not HTTP(S); nothing was looked up.
    Skipped,
    /// Rules could not be loaded.
    StoreUnavailable,
    NoMatch,
    /// The matching rule's favicon URL is unusable.
    InvalidFavicon(Rule),
    Applied(Rule),
}

/// Wires the rule store, the resolver and a tab's controller together.
pub struct Orchestrator {
    store: Arc<dyn RuleStore>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Looks up the rule for `url` without touching any document.
    pub async fn lookup(&self, url: &str) -> Option<Rule> {
        if !is_http_url(url) {
            return None;
        }
        match self.store.get().await {
            Ok(rules) => resolve(&rules, url).cloned(),
            Err(e) => {
                warn!("Failed to load rules: {:#}", e);
                None
            }
        }
    }

    /// Handles a completed navigation of the tab owning `controller`.
    pub async fn on_navigation_completed(
        &self,
        controller: &Controller,
        url: &str,
    ) -> NavigationOutcome {
        if !is_http_url(url) {
            debug!(url = %url, "Not an HTTP(S) page, skipping");
            return NavigationOutcome::Skipped;
        }

        let rules = match self.store.get().await {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Failed to load rules: {:#}", e);
                return NavigationOutcome::StoreUnavailable;
            }
        };

        let Some(rule) = resolve(&rules, url).cloned() else {
            debug!(url = %url, "No rule matches");
            return NavigationOutcome::NoMatch;
        };

        if !is_valid_favicon_url(&rule.favicon_url) {
            warn!(rule = %rule.id, favicon = %rule.favicon_url, "Rule has an invalid favicon URL");
            return NavigationOutcome::InvalidFavicon(rule);
        }

        info!(url = %url, rule = %rule.id, kind = rule.kind.as_str(), "Applying favicon override");
        controller.activate_and_apply(&rule.favicon_url);
        NavigationOutcome::Applied(rule)
    }

    /// Turns the override off in the tab owning `controller`.
    pub fn clear(&self, controller: &Controller) {
        controller.activate_and_clear();
    }
}
