mod import;
mod matcher;
mod pattern;
mod types;

pub use import::{
    export_rules, import_rules, is_valid_favicon_url, parse_rules, parse_stored_rules,
    validate_rule, ImportError, RuleValidationError,
};
pub use matcher::{is_http_url, resolve, rule_matches, url_host, CompiledRules};
pub use pattern::compile_pattern;
pub use types::{now_millis, Rule, RuleKind};
