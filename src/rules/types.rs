use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Exact host equality.
    Domain,
    /// `scheme://host/path` match pattern.
    Pattern,
}

impl RuleKind {
    /// Rank used by the tie-break: patterns outrank domains.
    pub(crate) fn rank(self) -> u8 {
        match self {
            RuleKind::Domain => 1,
            RuleKind::Pattern => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Domain => "domain",
            RuleKind::Pattern => "pattern",
        }
    }
}

/// A user-authored favicon override.
///
/// Decoding is lenient: records coming back from storage or an import file
/// are normalised through [`RawRule`] so a missing or mistyped field never
/// rejects the whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRule")]
pub struct Rule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub value: String,
    pub favicon_url: String,
    pub enabled: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        value: impl Into<String>,
        favicon_url: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            kind,
            value: value.into(),
            favicon_url: favicon_url.into(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn domain(id: impl Into<String>, value: impl Into<String>, favicon_url: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Domain, value, favicon_url)
    }

    pub fn pattern(id: impl Into<String>, value: impl Into<String>, favicon_url: impl Into<String>) -> Self {
        Self::new(id, RuleKind::Pattern, value, favicon_url)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Persisted record as found on disk, every field optional and untyped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub favicon_url: Option<Value>,
    #[serde(default)]
    pub enabled: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<Value>,
}

impl RawRule {
    pub fn id(&self) -> Option<String> {
        let id = coerce_string(self.id.as_ref());
        (!id.is_empty()).then_some(id)
    }

    pub fn kind(&self) -> RuleKind {
        match &self.kind {
            Some(Value::String(s)) if s == "pattern" => RuleKind::Pattern,
            _ => RuleKind::Domain,
        }
    }

    /// Key used to collapse duplicate records during import.
    pub fn dedupe_key(&self) -> String {
        match self.id() {
            Some(id) => format!("id:{}", id),
            None => format!(
                "vk:{}|{}|{}",
                self.kind().as_str(),
                coerce_string(self.value.as_ref()),
                coerce_string(self.favicon_url.as_ref())
            ),
        }
    }
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        let now = now_millis();
        Rule {
            id: raw.id().unwrap_or_else(crate::store::generate_id),
            kind: raw.kind(),
            value: coerce_string(raw.value.as_ref()),
            favicon_url: coerce_string(raw.favicon_url.as_ref()),
            enabled: !matches!(raw.enabled, Some(Value::Bool(false))),
            created_at: coerce_timestamp(raw.created_at.as_ref()).unwrap_or(now),
            updated_at: coerce_timestamp(raw.updated_at.as_ref()).unwrap_or(now),
        }
    }
}

/// Falsy values become the empty string, everything else its textual form.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn coerce_timestamp(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .filter(|ts| *ts > 0),
        _ => None,
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
