//! Error collection and violation-aware message selection.
//!
//! A validation run appends human-readable messages per attribute into an
//! [`ErrorCollection`]. Which message gets appended is decided here, by
//! matching the failing rule's violation codes against the caller-supplied
//! [`MessageOverrides`] from most to least specific key:
//! `attribute.rule.code`, then `attribute.rule`, then `attribute`. Both a
//! generic and a specific override can surface for one violation; a missing
//! override degrades to a defined default message, never an error.

use std::fmt;

/// Caller-supplied message overrides, in declaration order.
///
/// Keys are `attribute`, `attribute.ruleName`, or
/// `attribute.ruleName.violationCode`. Read-only during a run.
#[derive(Debug, Clone, Default)]
pub struct MessageOverrides {
    entries: Vec<(String, String)>,
}

impl MessageOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override. Declaration order is lookup order.
    pub fn message(mut self, key: &str, text: &str) -> Self {
        self.entries.push((key.to_string(), text.to_string()));
        self
    }

    /// First entry with exactly this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MessageOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Selects the messages for one rule failure.
///
/// `rule_key` is the failing rule's message key (registry identifier, the
/// rule's own name, or a positional index for anonymous callables).
///
/// With no violation codes, the single message comes from the first override
/// (declaration order) whose key equals the attribute or starts with
/// `attribute.rule_key`. With violation codes, each code contributes every
/// override found under `attribute.rule_key` and
/// `attribute.rule_key.code` — the generic and the specific both surface.
/// When nothing matches, the defined default message is returned.
pub fn select_messages(
    attribute: &str,
    rule_key: &str,
    violations: &[String],
    overrides: &MessageOverrides,
) -> Vec<String> {
    let prefix = format!("{attribute}.{rule_key}");
    let mut selected = Vec::new();

    if violations.is_empty() {
        let found = overrides
            .iter()
            .find(|(key, _)| *key == attribute || key.starts_with(prefix.as_str()))
            .map(|(_, text)| text.to_string());
        if let Some(text) = found {
            selected.push(text);
        }
    } else {
        for code in violations {
            if let Some(text) = overrides.get(&prefix) {
                selected.push(text.to_string());
            }
            if let Some(text) = overrides.get(&format!("{prefix}.{code}")) {
                selected.push(text.to_string());
            }
        }
    }

    if selected.is_empty() {
        selected.push(default_message(attribute));
    }
    selected
}

/// The message appended when no override matches a failure.
pub fn default_message(attribute: &str) -> String {
    format!("validation failed for {attribute}")
}

/// Ordered, append-only mapping from attribute to its failure messages.
///
/// An attribute's entry is created on first failure and extended on later
/// failures within the same run.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollection {
    entries: Vec<(String, Vec<String>)>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of messages across all attributes.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, msgs)| msgs.len()).sum()
    }

    /// Messages recorded for one attribute, in recording order.
    pub fn get(&self, attribute: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(attr, _)| attr == attribute)
            .map(|(_, msgs)| msgs.as_slice())
    }

    /// Number of failures already recorded for an attribute. This doubles as
    /// the positional message key for anonymous rules.
    pub fn count_for(&self, attribute: &str) -> usize {
        self.get(attribute).map_or(0, <[String]>::len)
    }

    /// Appends messages under an attribute, creating its entry on first use.
    pub fn append(&mut self, attribute: &str, messages: Vec<String>) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(attr, _)| attr == attribute) {
            existing.extend(messages);
        } else {
            self.entries.push((attribute.to_string(), messages));
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(attr, msgs)| (attr.as_str(), msgs.as_slice()))
    }

    /// JSON object view: attribute → array of messages, in recording order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (attr, msgs) in &self.entries {
            object.insert(
                attr.clone(),
                serde_json::Value::Array(
                    msgs.iter()
                        .map(|m| serde_json::Value::String(m.clone()))
                        .collect(),
                ),
            );
        }
        serde_json::Value::Object(object)
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (attr, msgs) in &self.entries {
            for msg in msgs {
                writeln!(f, "{attr}: {msg}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod message_tests {
    use super::*;

    #[test]
    fn specific_code_override_is_selected() {
        let overrides = MessageOverrides::new()
            .message("name", "Required")
            .message("name.email.format", "Bad format");
        let picked = select_messages("name", "email", &["format".to_string()], &overrides);
        assert_eq!(picked, vec!["Bad format".to_string()]);
    }

    #[test]
    fn rule_level_override_covers_any_code() {
        let overrides = MessageOverrides::new().message("name.email", "Invalid");
        let picked = select_messages("name", "email", &["format".to_string()], &overrides);
        assert_eq!(picked, vec!["Invalid".to_string()]);
    }

    #[test]
    fn generic_and_specific_both_surface() {
        let overrides = MessageOverrides::new()
            .message("name.email", "Invalid")
            .message("name.email.format", "Bad format");
        let picked = select_messages("name", "email", &["format".to_string()], &overrides);
        assert_eq!(
            picked,
            vec!["Invalid".to_string(), "Bad format".to_string()]
        );
    }

    #[test]
    fn codeless_failure_takes_first_gathered_override() {
        let overrides = MessageOverrides::new()
            .message("other", "nope")
            .message("name", "Name is required");
        let picked = select_messages("name", "required", &[], &overrides);
        assert_eq!(picked, vec!["Name is required".to_string()]);
    }

    #[test]
    fn missing_override_degrades_to_default() {
        let overrides = MessageOverrides::new();
        let picked = select_messages("name", "required", &[], &overrides);
        assert_eq!(picked, vec![default_message("name")]);
        let picked = select_messages("name", "email", &["format".to_string()], &overrides);
        assert_eq!(picked, vec![default_message("name")]);
    }

    #[test]
    fn collection_entries_extend_in_order() {
        let mut errors = ErrorCollection::new();
        errors.append("name", vec!["first".to_string()]);
        errors.append("name", vec!["second".to_string()]);
        errors.append("age", vec!["third".to_string()]);
        assert_eq!(errors.count_for("name"), 2);
        assert_eq!(
            errors.get("name").unwrap(),
            &["first".to_string(), "second".to_string()]
        );
        let attrs: Vec<&str> = errors.iter().map(|(a, _)| a).collect();
        assert_eq!(attrs, vec!["name", "age"]);
    }

    #[test]
    fn json_view_keeps_shape() {
        let mut errors = ErrorCollection::new();
        errors.append("name", vec!["oops".to_string()]);
        assert_eq!(
            errors.to_json(),
            serde_json::json!({ "name": ["oops"] })
        );
    }
}
