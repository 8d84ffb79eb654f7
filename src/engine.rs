//! The validation engine.
//!
//! A [`Validator`] owns the input data, the normalized rule table, the
//! message overrides, and (via `Arc`) the rule registry. `validate()` walks
//! attributes in declaration order and each attribute's rules in declaration
//! order, deciding per rule between bypass (the `sometimes` presence gate on
//! an empty value aborts the rest of the attribute), pass (skip predicate,
//! empty-allowance, or a clean check), and failure (record messages, and in
//! stop-on-first-failure mode terminate the whole run).
//!
//! Validation is a pure in-memory computation: no I/O, no suspension points.
//! Setup errors (unknown identifiers, bad rule arguments) surface from
//! construction and `set_rules`; a run itself never fails with an error —
//! it produces an [`ErrorCollection`].

use std::sync::Arc;

use crate::diagnostics::CrivoError;
use crate::messages::{select_messages, ErrorCollection, MessageOverrides};
use crate::normalize::{normalize, RawRules, RuleTable};
use crate::registry::RuleRegistry;
use crate::rule::{RuleSpec, Verdict};
use crate::value::Value;

/// The input data mapping: attribute name → value.
pub type DataMap = im::HashMap<String, Value>;

/// Converts a JSON object into a data mapping. Non-object values get no
/// attributes.
pub fn data_from_json(json: serde_json::Value) -> DataMap {
    match Value::from(json) {
        Value::Map(map) => map,
        _ => DataMap::new(),
    }
}

/// Validates a data mapping against a declarative rule table.
#[derive(Debug)]
pub struct Validator {
    registry: Arc<RuleRegistry>,
    data: DataMap,
    table: RuleTable,
    messages: MessageOverrides,
    errors: ErrorCollection,
    stop_on_first_failure: bool,
}

impl Validator {
    /// Builds a validator over the standard rule registry. Rule
    /// normalization happens here; string-form rules that do not resolve or
    /// construct fail the build.
    pub fn new(data: DataMap, rules: impl Into<RawRules>) -> Result<Self, CrivoError> {
        Self::with_registry(data, rules, Arc::new(RuleRegistry::with_defaults()))
    }

    /// Builds a validator over a caller-supplied registry. Validators that
    /// share a registry share its rules and its parse cache.
    pub fn with_registry(
        data: DataMap,
        rules: impl Into<RawRules>,
        registry: Arc<RuleRegistry>,
    ) -> Result<Self, CrivoError> {
        let table = normalize(&registry, rules.into())?;
        Ok(Self {
            registry,
            data,
            table,
            messages: MessageOverrides::new(),
            errors: ErrorCollection::new(),
            stop_on_first_failure: false,
        })
    }

    /// Attaches caller message overrides, consuming the validator.
    pub fn with_messages(mut self, messages: MessageOverrides) -> Self {
        self.messages = messages;
        self
    }

    pub fn data(&self) -> &DataMap {
        &self.data
    }

    pub fn rules(&self) -> &RuleTable {
        &self.table
    }

    pub fn messages(&self) -> &MessageOverrides {
        &self.messages
    }

    /// Re-normalizes and replaces the active rule table.
    pub fn set_rules(&mut self, rules: impl Into<RawRules>) -> Result<&RuleTable, CrivoError> {
        self.table = normalize(&self.registry, rules.into())?;
        Ok(&self.table)
    }

    /// Enables or disables aborting the entire run on an attribute's first
    /// recorded error. Chainable.
    pub fn stop_on_first_failure(&mut self, flag: bool) -> &mut Self {
        self.stop_on_first_failure = flag;
        self
    }

    /// Runs validation. Returns true iff no errors were recorded. Each call
    /// starts from an empty error collection, so repeated calls on an
    /// unmodified validator yield identical results.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        let table = self.table.clone();

        'attributes: for (attribute, specs) in &table {
            let value = self.data.get(attribute).cloned().unwrap_or(Value::Null);

            for spec in specs {
                let rule = spec.resolve(&value);

                // Presence gate on an empty value: abort the rest of this
                // attribute without the stop-on-failure check. Earlier errors
                // on this attribute stay recorded; the run continues.
                if rule.gates_on_presence() && value.is_empty_input() {
                    continue 'attributes;
                }

                let exempt =
                    rule.skips(&value) || (rule.allows_empty() && value.is_empty_input());
                if !exempt {
                    if let Verdict::Fail(violations) = rule.check(&value) {
                        self.record_error(attribute, spec, &violations);
                    }
                }

                if self.stop_on_first_failure && self.errors.count_for(attribute) > 0 {
                    return false;
                }
            }
        }

        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors from the most recent `validate()` call.
    pub fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    // The message key is the spec's captured identifier when it has one;
    // anonymous callables key by the count of errors already recorded for
    // the attribute, so a key always exists.
    fn record_error(&mut self, attribute: &str, spec: &RuleSpec, violations: &[String]) {
        let key = if spec.name().is_empty() {
            self.errors.count_for(attribute).to_string()
        } else {
            spec.name().to_string()
        };
        let selected = select_messages(attribute, &key, violations, &self.messages);
        self.errors.append(attribute, selected);
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::normalize::Rules;

    fn data(pairs: &[(&str, Value)]) -> DataMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn passing_data_yields_no_errors() {
        let mut validator = Validator::new(
            data(&[
                ("name", Value::from("Ada")),
                ("email", Value::from("ada@lovelace.dev")),
            ]),
            Rules::new()
                .field("name", "required|min:3")
                .field("email", "required|email"),
        )
        .unwrap();
        assert!(validator.validate());
        assert!(!validator.has_errors());
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn absent_attribute_validates_as_null() {
        let mut validator =
            Validator::new(DataMap::new(), Rules::new().field("name", "required")).unwrap();
        assert!(!validator.validate());
        assert_eq!(validator.errors().count_for("name"), 1);
    }

    #[test]
    fn set_rules_replaces_the_table() {
        let mut validator = Validator::new(
            data(&[("age", Value::Number(15.0))]),
            Rules::new().field("age", "required"),
        )
        .unwrap();
        assert!(validator.validate());
        validator
            .set_rules(Rules::new().field("age", "required|min:18"))
            .unwrap();
        assert!(!validator.validate());
    }
}
