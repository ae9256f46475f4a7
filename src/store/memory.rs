use super::types::RuleStore;
use crate::rules::Rule;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get(&self) -> Result<Vec<Rule>> {
        let rules = self
            .rules
            .read()
            .map_err(|_| anyhow::anyhow!("rule store lock poisoned"))?;
        Ok(rules.clone())
    }

    async fn set(&self, rules: Vec<Rule>) -> Result<()> {
        let mut guard = self
            .rules
            .write()
            .map_err(|_| anyhow::anyhow!("rule store lock poisoned"))?;
        *guard = rules;
        Ok(())
    }
}
