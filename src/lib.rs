pub use crate::diagnostics::{to_error_source, CrivoError, ErrorContext, Span};
pub use crate::engine::{data_from_json, DataMap, Validator};
pub use crate::messages::{ErrorCollection, MessageOverrides};
pub use crate::normalize::{normalize, RawRules, RuleSet, RuleTable, Rules};
pub use crate::registry::RuleRegistry;
pub use crate::rule::{BoxedRule, Rule, RuleSpec, SharedRule, Verdict};
pub use crate::value::Value;

pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod messages;
pub mod normalize;
pub mod parser;
pub mod registry;
pub mod rule;
pub mod rules_std;
pub mod value;
