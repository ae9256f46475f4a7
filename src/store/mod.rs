pub mod file;
pub mod memory;
pub mod types;

pub use self::file::FileRuleStore;
pub use self::memory::MemoryRuleStore;
pub use self::types::RuleStore;

use crate::rules::{now_millis, Rule, RuleKind};
use anyhow::Result;
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Fields a caller supplies when creating or editing a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub id: Option<String>,
    pub kind: RuleKind,
    pub value: String,
    pub favicon_url: String,
    pub enabled: bool,
}

impl RuleDraft {
    pub fn new(kind: RuleKind, value: impl Into<String>, favicon_url: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            value: value.into(),
            favicon_url: favicon_url.into(),
            enabled: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The rule this draft would become, for validation before saving.
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(
            self.id.clone().unwrap_or_default(),
            self.kind,
            self.value.clone(),
            self.favicon_url.clone(),
        );
        rule.enabled = self.enabled;
        rule
    }
}

/// `<millis>-<8 base36 chars>`, unique within the process.
pub fn generate_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut hasher = FxHasher::default();
    hasher.write_u64(nanos);
    hasher.write_u64(COUNTER.fetch_add(1, Ordering::Relaxed));

    let mut n = hasher.finish();
    let mut suffix = String::with_capacity(8);
    for _ in 0..8 {
        let digit = (n % 36) as u32;
        suffix.push(std::char::from_digit(digit, 36).unwrap_or('0'));
        n /= 36;
    }
    format!("{}-{}", now_millis(), suffix)
}

/// Updates the rule with the draft's id in place, or appends a new rule.
pub async fn upsert_rule(store: &dyn RuleStore, draft: RuleDraft) -> Result<Vec<Rule>> {
    let mut rules = store.get().await?;
    let now = now_millis();

    let existing = draft
        .id
        .as_deref()
        .and_then(|id| rules.iter().position(|r| r.id == id));

    match existing {
        Some(idx) => {
            let rule = &mut rules[idx];
            rule.kind = draft.kind;
            rule.value = draft.value;
            rule.favicon_url = draft.favicon_url;
            rule.enabled = draft.enabled;
            rule.updated_at = now;
            info!("Updated rule {}", rule.id);
        }
        None => {
            let id = draft
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_id);
            info!("Added rule {} ({} {})", id, draft.kind.as_str(), draft.value);
            rules.push(Rule {
                id,
                kind: draft.kind,
                value: draft.value,
                favicon_url: draft.favicon_url,
                enabled: draft.enabled,
                created_at: now,
                updated_at: now,
            });
        }
    }

    store.set(rules.clone()).await?;
    Ok(rules)
}

pub async fn delete_rule(store: &dyn RuleStore, id: &str) -> Result<Vec<Rule>> {
    let rules: Vec<Rule> = store
        .get()
        .await?
        .into_iter()
        .filter(|r| r.id != id)
        .collect();
    store.set(rules.clone()).await?;
    Ok(rules)
}

pub async fn set_rules(store: &dyn RuleStore, rules: Vec<Rule>) -> Result<Vec<Rule>> {
    store.set(rules.clone()).await?;
    Ok(rules)
}
