//! Parser for the compact rule specification string.
//!
//! Grammar: rules are separated by `|`; each rule token is either a bare
//! identifier (`required`) or an identifier with a positional argument list
//! (`between:1,10`). Arguments are comma-split verbatim — no trimming, no
//! quoting, and no escaping. A literal `|`, `:`, or `,` inside an argument is
//! disallowed input: there is no way to express one, and the string will
//! tokenize at the delimiter instead. Empty tokens (`a||b`, a trailing `|`,
//! `:x`) are rejected outright rather than silently skipped.
//!
//! Identifiers resolve against the supplied [`RuleRegistry`]; each token
//! constructs its rule through the registry's factory, so argument errors
//! surface here, at parse time. Callers normally go through
//! [`RuleRegistry::parse_cached`], which memoizes results per raw string.

use crate::diagnostics::{malformed, to_error_source, unknown_rule, CrivoError, Span};
use crate::registry::RuleRegistry;
use crate::rule::RuleSpec;

/// Parses a rule specification string into an ordered rule sequence.
pub fn parse(registry: &RuleRegistry, spec: &str) -> Result<Vec<RuleSpec>, CrivoError> {
    let source = to_error_source(spec);
    if spec.is_empty() {
        return Err(malformed(
            "empty rule specification",
            &source,
            Span::new(0, 0),
        ));
    }

    let mut rules = Vec::new();
    let mut offset = 0usize;
    for token in spec.split('|') {
        let token_span = Span::new(offset, offset + token.len());
        if token.is_empty() {
            return Err(malformed("empty rule token", &source, token_span));
        }

        let (identifier, args) = match token.split_once(':') {
            Some((identifier, rest)) => (
                identifier,
                rest.split(',').map(str::to_string).collect::<Vec<_>>(),
            ),
            None => (token, Vec::new()),
        };
        if identifier.is_empty() {
            return Err(malformed("missing rule identifier", &source, token_span));
        }

        let ident_span = Span::new(offset, offset + identifier.len());
        let factory = registry
            .resolve(identifier)
            .map_err(|_| unknown_rule(identifier, &source, ident_span))?;
        let rule = factory(&args)?;
        rules.push(RuleSpec::Bound {
            rule,
            name: identifier.to_string(),
        });

        offset += token.len() + 1; // step past the '|'
    }
    Ok(rules)
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::diagnostics::Span;
    use miette::Diagnostic;

    #[test]
    fn parses_identifiers_and_argument_lists_in_order() {
        let registry = RuleRegistry::with_defaults();
        let rules = parse(&registry, "required|between:1,10|email").unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].name(), "required");
        assert_eq!(rules[1].name(), "between");
        assert_eq!(rules[2].name(), "email");
    }

    #[test]
    fn unknown_identifier_is_labeled_at_its_token() {
        let registry = RuleRegistry::with_defaults();
        let err = parse(&registry, "required|bogus").unwrap_err();
        match &err {
            CrivoError::UnknownRule { identifier, ctx } => {
                assert_eq!(identifier, "bogus");
                assert_eq!(ctx.span, Some(Span::new(9, 14)));
            }
            other => panic!("expected UnknownRule, got {other:?}"),
        }
        assert!(err.labels().is_some());
    }

    #[test]
    fn empty_tokens_are_malformed() {
        let registry = RuleRegistry::with_defaults();
        for spec in ["", "a||b", "required|", ":3", "|required"] {
            let err = parse(&registry, spec).unwrap_err();
            assert!(
                matches!(err, CrivoError::MalformedRuleString { .. }),
                "{spec:?} should be malformed"
            );
        }
    }

    #[test]
    fn factory_argument_errors_surface_at_parse_time() {
        let registry = RuleRegistry::with_defaults();
        let err = parse(&registry, "min:abc").unwrap_err();
        assert!(matches!(err, CrivoError::InvalidRule { .. }));
    }

    #[test]
    fn arguments_are_split_verbatim() {
        let registry = RuleRegistry::with_defaults();
        // "in: a" keeps the leading space in the argument.
        let rules = parse(&registry, "in: a,b").unwrap();
        let rule = rules[0].resolve(&crate::value::Value::Null);
        assert!(rule.check(&crate::value::Value::from(" a")).is_pass());
        assert!(!rule.check(&crate::value::Value::from("a")).is_pass());
    }
}
