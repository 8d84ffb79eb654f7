use std::sync::Arc;

use crate::diagnostics::CrivoError;
use crate::value::Value;

/// Result of applying a rule's validity check to one value.
///
/// Violation codes name which sub-condition of the rule failed (e.g. the
/// `email` rule failing with `"format"`); message selection uses them to pick
/// the most specific caller override. A failure may carry no codes at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Vec<String>),
}

impl Verdict {
    /// A failure with a single violation code.
    pub fn fail(code: &str) -> Self {
        Verdict::Fail(vec![code.to_string()])
    }

    /// A failure with no violation codes.
    pub fn fail_bare() -> Self {
        Verdict::Fail(Vec::new())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

// The rule capability set. Checks are stateless: violations are returned,
// never stored on the rule, so one instance is safely shared across runs.
pub trait Rule: Send + Sync {
    /// Stable identifier, used as the message-selection key.
    fn name(&self) -> &str;

    /// The validity check over a single value.
    fn check(&self, value: &Value) -> Verdict;

    /// True when the rule declares it can skip validation for this value.
    fn skips(&self, _value: &Value) -> bool {
        false
    }

    /// True when empty values (`Null`, `""`) always satisfy this rule.
    fn allows_empty(&self) -> bool {
        false
    }

    /// True for the conditional-presence sentinel: on an empty value, the
    /// engine bypasses every remaining rule for the attribute.
    fn gates_on_presence(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name()).finish()
    }
}

pub type BoxedRule = Box<dyn Rule>;
pub type SharedRule = Arc<dyn Rule>;

// Constructs a rule from the positional argument list of a rule string token.
// Argument validation happens here, at parse time, not during a run.
pub type RuleFactory = dyn Fn(&[String]) -> Result<SharedRule, CrivoError> + Send + Sync;

// A callable rule is a rule *factory* over the candidate value: it receives
// the value and returns the rule object to check, not a boolean.
pub type CallableRule = dyn Fn(&Value) -> BoxedRule + Send + Sync;

/// A single validation unit bound to one attribute at one position.
///
/// Created during normalization, immutable thereafter, and reused across
/// `validate()` calls on the same validator.
#[derive(Clone)]
pub enum RuleSpec {
    /// A rule resolved at normalization time. `name` is the registry
    /// identifier the rule was constructed under (or the rule's own declared
    /// name), and keys its error messages.
    Bound { rule: SharedRule, name: String },
    /// A callable awaiting a value; resolved once per rule application.
    /// Anonymous: its messages key by position.
    Callable { func: Arc<CallableRule> },
}

impl RuleSpec {
    /// Binds an already-constructed rule under its own declared name.
    pub fn bound(rule: BoxedRule) -> Self {
        let name = rule.name().to_string();
        RuleSpec::Bound {
            rule: Arc::from(rule),
            name,
        }
    }

    /// Binds a rule under an explicit identifier.
    pub fn bound_as(rule: BoxedRule, name: impl Into<String>) -> Self {
        RuleSpec::Bound {
            rule: Arc::from(rule),
            name: name.into(),
        }
    }

    /// Wraps a callable rule factory.
    pub fn callable<F>(func: F) -> Self
    where
        F: Fn(&Value) -> BoxedRule + Send + Sync + 'static,
    {
        RuleSpec::Callable {
            func: Arc::new(func),
        }
    }

    /// The message-selection key, empty for anonymous callables.
    pub fn name(&self) -> &str {
        match self {
            RuleSpec::Bound { name, .. } => name,
            RuleSpec::Callable { .. } => "",
        }
    }

    /// Resolves the spec against the current value into a checkable rule.
    pub fn resolve(&self, value: &Value) -> SharedRule {
        match self {
            RuleSpec::Bound { rule, .. } => Arc::clone(rule),
            RuleSpec::Callable { func } => Arc::from(func(value)),
        }
    }
}

impl std::fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSpec::Bound { name, .. } => write!(f, "RuleSpec::Bound({name})"),
            RuleSpec::Callable { .. } => write!(f, "RuleSpec::Callable"),
        }
    }
}
