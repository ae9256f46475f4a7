use super::types::{now_millis, RawRule, Rule, RuleKind};
use rustc_hash::FxHashSet;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Reasons an import payload is refused as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Expected an array of rules")]
    NotAnArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleValidationError {
    #[error("Missing domain")]
    MissingDomain,
    #[error("Missing pattern")]
    MissingPattern,
    #[error("Invalid favicon URL")]
    InvalidFaviconUrl,
}

/// A favicon URL is usable when it is inline data or an absolute HTTP(S) URL.
pub fn is_valid_favicon_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if url.starts_with("data:") {
        return true;
    }
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

pub fn validate_rule(rule: &Rule) -> Result<(), RuleValidationError> {
    if rule.value.is_empty() {
        return Err(match rule.kind {
            RuleKind::Domain => RuleValidationError::MissingDomain,
            RuleKind::Pattern => RuleValidationError::MissingPattern,
        });
    }
    if !is_valid_favicon_url(&rule.favicon_url) {
        return Err(RuleValidationError::InvalidFaviconUrl);
    }
    Ok(())
}

/// Decodes stored rule JSON. Unlike [`import_rules`] it keeps `updatedAt`.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, ImportError> {
    parse_stored_rules(text).map(|(rules, _)| rules)
}

/// Like [`parse_rules`], also counting records that had no id and were given
/// a fresh one. Callers owning the storage should persist those ids.
pub fn parse_stored_rules(text: &str) -> Result<(Vec<Rule>, usize), ImportError> {
    let mut generated = 0;
    let rules = decode_records(text)?
        .into_iter()
        .map(|raw| {
            if raw.id().is_none() {
                generated += 1;
            }
            Rule::from(raw)
        })
        .collect();
    Ok((rules, generated))
}

/// Parses and sanitises an import file.
///
/// Duplicate records collapse onto the first occurrence, either by id or, for
/// records without one, by `(type, value, faviconUrl)`. Every surviving rule
/// gets `updatedAt = now`.
pub fn import_rules(text: &str) -> Result<Vec<Rule>, ImportError> {
    let mut seen = FxHashSet::default();
    let now = now_millis();

    let rules = decode_records(text)?
        .into_iter()
        .filter(|raw| seen.insert(raw.dedupe_key()))
        .map(|raw| {
            let mut rule = Rule::from(raw);
            rule.updated_at = now;
            rule
        })
        .collect();
    Ok(rules)
}

pub fn export_rules(rules: &[Rule]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rules)
}

fn decode_records(text: &str) -> Result<Vec<RawRule>, ImportError> {
    let data: Value = serde_json::from_str(text).map_err(ImportError::InvalidJson)?;
    let Value::Array(items) = data else {
        return Err(ImportError::NotAnArray);
    };

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!("Skipping rule record {}: not an object", idx);
            continue;
        }
        match serde_json::from_value::<RawRule>(item) {
            Ok(raw) => records.push(raw),
            Err(e) => warn!("Skipping rule record {}: {}", idx, e),
        }
    }
    Ok(records)
}
