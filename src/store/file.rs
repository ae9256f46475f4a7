use super::types::RuleStore;
use crate::rules::{export_rules, parse_stored_rules, Rule};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// JSON file holding the rule list as an array of rule records.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn get(&self) -> Result<Vec<Rule>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Rule file {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read rule file {}", self.path.display()))
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let (rules, generated) = parse_stored_rules(&contents)
            .with_context(|| format!("Failed to parse rule file {}", self.path.display()))?;

        // Pin ids given to id-less records so later reads agree with this one.
        if generated > 0 {
            info!("Assigned ids to {} rules in {}", generated, self.path.display());
            if let Err(e) = self.set(rules.clone()).await {
                warn!("Failed to persist assigned rule ids: {:#}", e);
            }
        }
        Ok(rules)
    }

    async fn set(&self, rules: Vec<Rule>) -> Result<()> {
        let json = export_rules(&rules).context("Failed to serialize rules")?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        info!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}
