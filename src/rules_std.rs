//! # Crivo Standard Rule Library
//!
//! The default identifier → rule mapping loaded by
//! [`RuleRegistry::with_defaults`](crate::registry::RuleRegistry::with_defaults).
//!
//! ## Rule Contracts
//!
//! - **Stateless checks**: a rule returns its violation codes from `check`;
//!   it never stores per-call state, so a single instance serves every run.
//! - **Skip on empty**: every rule except `required` and `filled` skips
//!   empty input (`Null`, `""`). Presence is `required`'s job; a lone
//!   `email` rule accepts an absent attribute.
//! - **Arguments are validated in the factory**, at parse time. A malformed
//!   argument list is an `InvalidRule` configuration error, never a
//!   validation failure.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::diagnostics::{invalid_rule, CrivoError};
use crate::registry::RuleRegistry;
use crate::rule::{Rule, SharedRule, Verdict};
use crate::value::Value;

/// Registers all standard rules in the given registry.
pub fn register_std_rules(registry: &mut RuleRegistry) {
    registry.register("required", |args| zero_arg(args, "required", || Required));
    registry.register("sometimes", |args| zero_arg(args, "sometimes", || Sometimes));
    registry.register("nullable", |args| zero_arg(args, "nullable", || Nullable));
    registry.register("filled", |args| zero_arg(args, "filled", || Filled));
    registry.register("email", |args| zero_arg(args, "email", || Email));
    registry.register("url", |args| zero_arg(args, "url", || Url));
    registry.register("alpha", |args| zero_arg(args, "alpha", || Alpha));
    registry.register("alpha_num", |args| zero_arg(args, "alpha_num", || AlphaNum));
    registry.register("numeric", |args| zero_arg(args, "numeric", || Numeric));
    registry.register("integer", |args| zero_arg(args, "integer", || Integer));
    registry.register("boolean", |args| zero_arg(args, "boolean", || Boolean));
    registry.register("min", |args| {
        Ok(shared(Min(numeric_arg("min", args, 0, 1)?)))
    });
    registry.register("max", |args| {
        Ok(shared(Max(numeric_arg("max", args, 0, 1)?)))
    });
    registry.register("size", |args| {
        Ok(shared(Size(numeric_arg("size", args, 0, 1)?)))
    });
    registry.register("between", |args| {
        let low = numeric_arg("between", args, 0, 2)?;
        let high = numeric_arg("between", args, 1, 2)?;
        if low > high {
            return Err(invalid_rule(format!(
                "`between` bounds are inverted: {low} > {high}"
            )));
        }
        Ok(shared(Between { low, high }))
    });
    registry.register("in", |args| {
        if args.is_empty() {
            return Err(invalid_rule("`in` expects at least 1 argument, got 0"));
        }
        Ok(shared(In(args.to_vec())))
    });
    registry.register("not_in", |args| {
        if args.is_empty() {
            return Err(invalid_rule("`not_in` expects at least 1 argument, got 0"));
        }
        Ok(shared(NotIn(args.to_vec())))
    });
    registry.register("matches", |args| {
        if args.len() != 1 {
            return Err(invalid_rule(format!(
                "`matches` expects exactly 1 argument, got {}",
                args.len()
            )));
        }
        let pattern = Regex::new(&args[0]).map_err(|e| {
            invalid_rule(format!("`matches` pattern does not compile: {e}"))
        })?;
        Ok(shared(Matches(pattern)))
    });
}

// ---
// Factory helpers
// ---

fn shared<R: Rule + 'static>(rule: R) -> SharedRule {
    Arc::new(rule)
}

fn zero_arg<R: Rule + 'static>(
    args: &[String],
    name: &str,
    build: impl FnOnce() -> R,
) -> Result<SharedRule, CrivoError> {
    if !args.is_empty() {
        return Err(invalid_rule(format!(
            "`{name}` expects no arguments, got {}",
            args.len()
        )));
    }
    Ok(shared(build()))
}

fn numeric_arg(name: &str, args: &[String], index: usize, arity: usize) -> Result<f64, CrivoError> {
    if args.len() != arity {
        return Err(invalid_rule(format!(
            "`{name}` expects exactly {arity} argument(s), got {}",
            args.len()
        )));
    }
    args[index].parse::<f64>().map_err(|_| {
        invalid_rule(format!(
            "`{name}` expects a numeric argument, got `{}`",
            args[index]
        ))
    })
}

// ---
// Magnitude: the shared size model for min/max/size/between
// ---

// String size is its grapheme count, not its byte length; numbers compare by
// value; lists and maps by element count.
fn magnitude(value: &Value) -> Option<(f64, &'static str)> {
    match value {
        Value::String(s) => Some((s.graphemes(true).count() as f64, "string")),
        Value::Number(n) => Some((*n, "numeric")),
        Value::List(items) => Some((items.len() as f64, "list")),
        Value::Map(map) => Some((map.len() as f64, "list")),
        _ => None,
    }
}

// ---
// Presence rules
// ---

struct Required;

impl Rule for Required {
    fn name(&self) -> &str {
        "required"
    }
    fn check(&self, value: &Value) -> Verdict {
        let missing = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        };
        if missing {
            Verdict::fail_bare()
        } else {
            Verdict::Pass
        }
    }
}

// The conditional-presence sentinel: on an empty value, the engine bypasses
// every remaining rule for the attribute.
struct Sometimes;

impl Rule for Sometimes {
    fn name(&self) -> &str {
        "sometimes"
    }
    fn check(&self, _value: &Value) -> Verdict {
        Verdict::Pass
    }
    fn gates_on_presence(&self) -> bool {
        true
    }
}

struct Nullable;

impl Rule for Nullable {
    fn name(&self) -> &str {
        "nullable"
    }
    fn check(&self, _value: &Value) -> Verdict {
        Verdict::Pass
    }
    fn allows_empty(&self) -> bool {
        true
    }
}

// When the attribute is present at all (non-null), it must not be the empty
// string. Absent attributes are outside its jurisdiction.
struct Filled;

impl Rule for Filled {
    fn name(&self) -> &str {
        "filled"
    }
    fn check(&self, value: &Value) -> Verdict {
        if value.as_str().is_some_and(str::is_empty) {
            Verdict::fail_bare()
        } else {
            Verdict::Pass
        }
    }
    fn skips(&self, value: &Value) -> bool {
        matches!(value, Value::Null)
    }
}

// ---
// Format rules
// ---

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email regex compiles")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url regex compiles")
});

struct Email;

impl Rule for Email {
    fn name(&self) -> &str {
        "email"
    }
    fn check(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(s) if EMAIL_RE.is_match(s) => Verdict::Pass,
            _ => Verdict::fail("format"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Url;

impl Rule for Url {
    fn name(&self) -> &str {
        "url"
    }
    fn check(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(s) if URL_RE.is_match(s) => Verdict::Pass,
            _ => Verdict::fail("format"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Alpha;

impl Rule for Alpha {
    fn name(&self) -> &str {
        "alpha"
    }
    fn check(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(s) if !s.is_empty() && s.chars().all(char::is_alphabetic) => Verdict::Pass,
            _ => Verdict::fail("format"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct AlphaNum;

impl Rule for AlphaNum {
    fn name(&self) -> &str {
        "alpha_num"
    }
    fn check(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(s) if !s.is_empty() && s.chars().all(char::is_alphanumeric) => Verdict::Pass,
            _ => Verdict::fail("format"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Matches(Regex);

impl Rule for Matches {
    fn name(&self) -> &str {
        "matches"
    }
    fn check(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(s) if self.0.is_match(s) => Verdict::Pass,
            _ => Verdict::fail("format"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

// ---
// Type rules
// ---

struct Numeric;

impl Rule for Numeric {
    fn name(&self) -> &str {
        "numeric"
    }
    fn check(&self, value: &Value) -> Verdict {
        let ok = match value {
            Value::Number(_) => true,
            Value::String(s) => s.parse::<f64>().is_ok(),
            _ => false,
        };
        if ok {
            Verdict::Pass
        } else {
            Verdict::fail("type")
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Integer;

impl Rule for Integer {
    fn name(&self) -> &str {
        "integer"
    }
    fn check(&self, value: &Value) -> Verdict {
        let ok = match value {
            Value::Number(n) => n.fract() == 0.0,
            Value::String(s) => s.parse::<i64>().is_ok(),
            _ => false,
        };
        if ok {
            Verdict::Pass
        } else {
            Verdict::fail("type")
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Boolean;

impl Rule for Boolean {
    fn name(&self) -> &str {
        "boolean"
    }
    fn check(&self, value: &Value) -> Verdict {
        let ok = match value {
            Value::Bool(_) => true,
            Value::Number(n) => *n == 0.0 || *n == 1.0,
            Value::String(s) => matches!(s.as_str(), "true" | "false" | "0" | "1"),
            _ => false,
        };
        if ok {
            Verdict::Pass
        } else {
            Verdict::fail("type")
        }
    }
    fn allows_empty(&self) -> bool {
        true
    }
}

// ---
// Magnitude rules
// ---

struct Min(f64);

impl Rule for Min {
    fn name(&self) -> &str {
        "min"
    }
    fn check(&self, value: &Value) -> Verdict {
        match magnitude(value) {
            Some((size, _)) if size >= self.0 => Verdict::Pass,
            Some((_, class)) => Verdict::fail(class),
            None => Verdict::fail("type"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Max(f64);

impl Rule for Max {
    fn name(&self) -> &str {
        "max"
    }
    fn check(&self, value: &Value) -> Verdict {
        match magnitude(value) {
            Some((size, _)) if size <= self.0 => Verdict::Pass,
            Some((_, class)) => Verdict::fail(class),
            None => Verdict::fail("type"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Size(f64);

impl Rule for Size {
    fn name(&self) -> &str {
        "size"
    }
    fn check(&self, value: &Value) -> Verdict {
        match magnitude(value) {
            Some((size, _)) if size == self.0 => Verdict::Pass,
            Some((_, class)) => Verdict::fail(class),
            None => Verdict::fail("type"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct Between {
    low: f64,
    high: f64,
}

impl Rule for Between {
    fn name(&self) -> &str {
        "between"
    }
    fn check(&self, value: &Value) -> Verdict {
        match magnitude(value) {
            Some((size, _)) if size >= self.low && size <= self.high => Verdict::Pass,
            Some((_, class)) => Verdict::fail(class),
            None => Verdict::fail("type"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

// ---
// Membership rules
// ---

// Membership compares the canonical string form of the value, so `in:1,2`
// accepts both the string "1" and the number 1.
fn canonical(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

struct In(Vec<String>);

impl Rule for In {
    fn name(&self) -> &str {
        "in"
    }
    fn check(&self, value: &Value) -> Verdict {
        match canonical(value) {
            Some(s) if self.0.contains(&s) => Verdict::Pass,
            _ => Verdict::fail("included"),
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

struct NotIn(Vec<String>);

impl Rule for NotIn {
    fn name(&self) -> &str {
        "not_in"
    }
    fn check(&self, value: &Value) -> Verdict {
        match canonical(value) {
            Some(s) if self.0.contains(&s) => Verdict::fail("excluded"),
            _ => Verdict::Pass,
        }
    }
    fn skips(&self, value: &Value) -> bool {
        value.is_empty_input()
    }
}

#[cfg(test)]
mod rules_std_tests {
    use super::*;

    fn rule(spec: &str) -> SharedRule {
        let registry = RuleRegistry::with_defaults();
        let (name, args) = match spec.split_once(':') {
            Some((name, rest)) => (
                name,
                rest.split(',').map(str::to_string).collect::<Vec<_>>(),
            ),
            None => (spec, Vec::new()),
        };
        registry.resolve(name).unwrap()(&args).unwrap()
    }

    #[test]
    fn required_rejects_all_empty_forms() {
        let required = rule("required");
        assert!(!required.check(&Value::Null).is_pass());
        assert!(!required.check(&Value::from("")).is_pass());
        assert!(!required.check(&Value::List(vec![])).is_pass());
        assert!(required.check(&Value::from("x")).is_pass());
        assert!(required.check(&Value::Number(0.0)).is_pass());
    }

    #[test]
    fn email_reports_format_violation() {
        let email = rule("email");
        assert!(email.check(&Value::from("ada@lovelace.dev")).is_pass());
        assert_eq!(
            email.check(&Value::from("not-an-email")),
            Verdict::fail("format")
        );
        assert!(email.skips(&Value::Null));
        assert!(email.skips(&Value::from("")));
    }

    #[test]
    fn min_counts_graphemes_not_bytes() {
        let min = rule("min:3");
        // Three graphemes, far more bytes.
        assert!(min.check(&Value::from("née")).is_pass());
        assert_eq!(min.check(&Value::from("ab")), Verdict::fail("string"));
        assert_eq!(min.check(&Value::Number(2.0)), Verdict::fail("numeric"));
        assert!(min.check(&Value::Number(3.5)).is_pass());
    }

    #[test]
    fn between_validates_bounds_at_construction() {
        let registry = RuleRegistry::with_defaults();
        let err = registry.resolve("between").unwrap()(&["5".into(), "2".into()]).unwrap_err();
        assert!(matches!(err, CrivoError::InvalidRule { .. }));
    }

    #[test]
    fn matches_compiles_pattern_in_factory() {
        let registry = RuleRegistry::with_defaults();
        let err = registry.resolve("matches").unwrap()(&["[".into()]).unwrap_err();
        assert!(matches!(err, CrivoError::InvalidRule { .. }));
        let ok = rule("matches:^[a-z]+$");
        assert!(ok.check(&Value::from("abc")).is_pass());
        assert!(!ok.check(&Value::from("ABC")).is_pass());
    }

    #[test]
    fn membership_canonicalizes_numbers() {
        let included = rule("in:1,2,admin");
        assert!(included.check(&Value::Number(1.0)).is_pass());
        assert!(included.check(&Value::from("admin")).is_pass());
        assert_eq!(
            included.check(&Value::from("guest")),
            Verdict::fail("included")
        );
    }

    #[test]
    fn boolean_allows_empty() {
        let boolean = rule("boolean");
        assert!(boolean.allows_empty());
        assert!(boolean.check(&Value::Bool(false)).is_pass());
        assert_eq!(boolean.check(&Value::from("yes")), Verdict::fail("type"));
    }

    #[test]
    fn filled_skips_absent_but_rejects_empty_string() {
        let filled = rule("filled");
        assert!(filled.skips(&Value::Null));
        assert!(!filled.skips(&Value::from("")));
        assert!(!filled.check(&Value::from("")).is_pass());
        assert!(filled.check(&Value::from("x")).is_pass());
    }
}
