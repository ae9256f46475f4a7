use crate::rules::Rule;
use anyhow::Result;
use async_trait::async_trait;

/// Opaque key-value home of the rule list. Last write wins.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get(&self) -> Result<Vec<Rule>>;
    async fn set(&self, rules: Vec<Rule>) -> Result<()>;
}
