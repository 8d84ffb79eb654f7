//! Unified, `miette`-based diagnostics for the Crivo engine.
//!
//! Every configuration-time failure — an unregistered rule identifier, a rule
//! object that breaks the capability contract, a rule string the parser cannot
//! tokenize — is represented by [`CrivoError`]. Validation failures are *not*
//! errors: they live in [`crate::messages::ErrorCollection`] and never pass
//! through this module.
//!
//! Errors carry an optional [`ErrorContext`] pointing into the text that
//! caused them (usually the raw rule specification string), so reports can
//! label the offending token instead of just naming it.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

/// Byte range into the text an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

pub type SourceArc = Arc<NamedSource<String>>;

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The text this error points into (if any).
    pub source: Option<SourceArc>,
    /// The offending range within that text (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }

    /// Attaches a help message, consuming the context.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Unified error type for all Crivo configuration failure modes.
///
/// These are setup-time failures and propagate synchronously to the caller;
/// they are never captured into the error collection a validation run
/// produces.
#[derive(Debug, Error)]
pub enum CrivoError {
    /// A rule identifier has no registry entry.
    #[error("unknown rule `{identifier}`")]
    UnknownRule {
        identifier: String,
        ctx: ErrorContext,
    },
    /// A supplied rule (or rule construction) breaks the capability contract.
    #[error("invalid rule: {message}")]
    InvalidRule { message: String, ctx: ErrorContext },
    /// A rule specification string does not match the `ident:a,b|ident` grammar.
    #[error("malformed rule string: {message}")]
    MalformedRuleString { message: String, ctx: ErrorContext },
}

impl CrivoError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            CrivoError::UnknownRule { ctx, .. } => ctx,
            CrivoError::InvalidRule { ctx, .. } => ctx,
            CrivoError::MalformedRuleString { ctx, .. } => ctx,
        }
    }

    fn primary_label(&self) -> String {
        match self {
            CrivoError::UnknownRule { .. } => "not registered".into(),
            CrivoError::InvalidRule { .. } => "invalid rule".into(),
            CrivoError::MalformedRuleString { .. } => "cannot be parsed".into(),
        }
    }
}

impl Diagnostic for CrivoError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            CrivoError::UnknownRule { .. } => "crivo::unknown_rule",
            CrivoError::InvalidRule { .. } => "crivo::invalid_rule",
            CrivoError::MalformedRuleString { .. } => "crivo::malformed_rule_string",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.get_ctx().span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.primary_label()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Wraps a raw rule specification string for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(source: S) -> SourceArc {
    Arc::new(NamedSource::new("rule string", source.as_ref().to_string()))
}

/// An unknown identifier inside a rule string, labeled at its token.
pub fn unknown_rule(identifier: &str, source: &SourceArc, span: Span) -> CrivoError {
    CrivoError::UnknownRule {
        identifier: identifier.to_string(),
        ctx: ErrorContext::with_source_and_span(Arc::clone(source), span)
            .help("register the rule or check the rule string for typos"),
    }
}

/// An unknown identifier with no surrounding rule string (registry lookup).
pub fn unknown_rule_bare(identifier: &str) -> CrivoError {
    CrivoError::UnknownRule {
        identifier: identifier.to_string(),
        ctx: ErrorContext::none(),
    }
}

/// A rule or rule construction that breaks the capability contract.
pub fn invalid_rule(message: impl Into<String>) -> CrivoError {
    CrivoError::InvalidRule {
        message: message.into(),
        ctx: ErrorContext::none(),
    }
}

/// A grammar violation inside a rule string, labeled at the offending range.
pub fn malformed(message: impl Into<String>, source: &SourceArc, span: Span) -> CrivoError {
    CrivoError::MalformedRuleString {
        message: message.into(),
        ctx: ErrorContext::with_source_and_span(Arc::clone(source), span),
    }
}

/// Prints a CrivoError with full miette diagnostics.
///
/// Use this for user-facing error display in CLI contexts.
pub fn print_error(error: CrivoError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod diagnostics_tests {
    use super::*;
    use miette::Report;

    #[test]
    fn labeled_span_appears_in_report() {
        let source = to_error_source("required|bogus");
        let err = unknown_rule("bogus", &source, Span::new(9, 14));
        let report = Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("unknown rule `bogus`"));
        assert!(output.contains("not registered"));
        assert!(output.contains("typos"));
    }

    #[test]
    fn context_free_errors_render_without_labels() {
        let err = invalid_rule("rule declares no name");
        assert!(err.labels().is_none());
        let report = Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("rule declares no name"));
    }

    #[test]
    fn error_codes_are_stable() {
        let err = unknown_rule_bare("email");
        assert_eq!(format!("{}", err.code().unwrap()), "crivo::unknown_rule");
    }
}
