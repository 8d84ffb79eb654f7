//! Normalizes caller-supplied rules into the uniform rule table.
//!
//! Callers express an attribute's rules three ways: a compact string
//! (`"required|email"`), a single rule or callable, or an explicit sequence.
//! [`normalize`] folds all three into ordered `Vec<RuleSpec>` sequences. The
//! source representation is the tagged [`RuleSet`] union, so "every element
//! is a rule or callable" holds by construction instead of by runtime
//! type-checking.

use crate::diagnostics::CrivoError;
use crate::registry::RuleRegistry;
use crate::rule::{BoxedRule, RuleSpec};
use crate::value::Value;

/// One attribute's rules, in any of the accepted source forms.
pub enum RuleSet {
    /// A pipe-delimited rule specification string, parsed via the registry.
    Str(String),
    /// A single pre-built rule or callable.
    One(RuleSpec),
    /// An explicit ordered sequence, used as-is.
    Many(Vec<RuleSpec>),
}

impl RuleSet {
    /// A single callable rule factory: invoked with the candidate value, it
    /// returns the rule object to check (it is not a predicate itself).
    pub fn callable<F>(func: F) -> Self
    where
        F: Fn(&Value) -> BoxedRule + Send + Sync + 'static,
    {
        RuleSet::One(RuleSpec::callable(func))
    }
}

impl From<&str> for RuleSet {
    fn from(spec: &str) -> Self {
        RuleSet::Str(spec.to_string())
    }
}

impl From<String> for RuleSet {
    fn from(spec: String) -> Self {
        RuleSet::Str(spec)
    }
}

impl From<RuleSpec> for RuleSet {
    fn from(spec: RuleSpec) -> Self {
        RuleSet::One(spec)
    }
}

impl From<BoxedRule> for RuleSet {
    fn from(rule: BoxedRule) -> Self {
        RuleSet::One(RuleSpec::bound(rule))
    }
}

impl From<Vec<RuleSpec>> for RuleSet {
    fn from(specs: Vec<RuleSpec>) -> Self {
        RuleSet::Many(specs)
    }
}

/// Ordered attribute → rule-set pairs, as supplied by the caller.
pub type RawRules = Vec<(String, RuleSet)>;

/// Ordered attribute → rule-sequence pairs. Order is execution order.
pub type RuleTable = Vec<(String, Vec<RuleSpec>)>;

/// Ordered rule builder.
///
/// # Examples
///
/// ```rust
/// use crivo::normalize::Rules;
/// let rules = Rules::new()
///     .field("name", "required|min:3")
///     .field("email", "sometimes|email");
/// ```
#[derive(Default)]
pub struct Rules {
    entries: RawRules,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rules for an attribute. Declaration order is execution order.
    pub fn field(mut self, attribute: &str, rules: impl Into<RuleSet>) -> Self {
        self.entries.push((attribute.to_string(), rules.into()));
        self
    }

    pub fn into_raw(self) -> RawRules {
        self.entries
    }
}

impl From<Rules> for RawRules {
    fn from(rules: Rules) -> Self {
        rules.entries
    }
}

/// Builds the rule table, preserving attribute order from the input.
/// String-form rules go through the registry's parse cache.
pub fn normalize(registry: &RuleRegistry, raw: RawRules) -> Result<RuleTable, CrivoError> {
    let mut table = Vec::with_capacity(raw.len());
    for (attribute, set) in raw {
        let specs = match set {
            RuleSet::Str(spec) => registry.parse_cached(&spec)?,
            RuleSet::One(spec) => vec![spec],
            RuleSet::Many(specs) => specs,
        };
        table.push((attribute, specs));
    }
    Ok(table)
}
