//! Matcher rule format (spec.md §6 "Rule format (consumed)").
//!
//! Rules are YAML documents forwarded to the matcher unchanged apart from
//! optional config merging. We parse only enough locally to validate the
//! required keys before spawning a subprocess — the supplemented
//! "rule validation pre-flight" feature from SPEC_FULL.md §C.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{CoreError, ErrorKind};

/// The subset of a rule document the core cares about. Everything else in
/// the YAML is forwarded opaquely.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleHeader {
    pub id: String,
    pub language: String,
    #[serde(default)]
    pub rule: Value,
}

/// A rule document, kept as raw text (for forwarding) alongside its parsed
/// header (for local validation).
#[derive(Debug, Clone)]
pub struct RuleDocument {
    pub raw_yaml: String,
    pub header: RuleHeader,
}

impl RuleDocument {
    /// Parse and validate a rule document. Returns `RuleInvalid` if the
    /// required `id`/`language`/`rule` keys are missing or malformed,
    /// without ever invoking the matcher (spec.md §7).
    pub fn parse(raw_yaml: &str) -> Result<Self, CoreError> {
        let header: RuleHeader = serde_yaml::from_str(raw_yaml).map_err(|e| {
            CoreError::new(ErrorKind::RuleInvalid, format!("invalid rule document: {e}"))
        })?;

        if header.id.trim().is_empty() {
            return Err(CoreError::new(
                ErrorKind::RuleInvalid,
                "rule is missing a non-empty 'id'",
            ));
        }
        if header.language.trim().is_empty() {
            return Err(CoreError::new(
                ErrorKind::RuleInvalid,
                "rule is missing a non-empty 'language'",
            ));
        }
        if matches!(header.rule, Value::Null) {
            return Err(CoreError::new(
                ErrorKind::RuleInvalid,
                "rule is missing a 'rule' clause",
            ));
        }

        Ok(Self {
            raw_yaml: raw_yaml.to_string(),
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rule_parses() {
        let yaml = r#"
id: no-console-log
language: javascript
rule:
  pattern: console.log($$$ARGS)
"#;
        let doc = RuleDocument::parse(yaml).unwrap();
        assert_eq!(doc.header.id, "no-console-log");
        assert_eq!(doc.header.language, "javascript");
    }

    #[test]
    fn missing_id_is_rule_invalid() {
        let yaml = r#"
language: javascript
rule:
  pattern: console.log($$$ARGS)
"#;
        let err = RuleDocument::parse(yaml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuleInvalid);
    }

    #[test]
    fn relational_rule_with_stop_by_parses() {
        let yaml = r#"
id: inside-loop
language: python
rule:
  kind: call_expression
  inside:
    kind: for_statement
    stopBy: end
"#;
        let doc = RuleDocument::parse(yaml).unwrap();
        assert_eq!(doc.header.id, "inside-loop");
    }
}
