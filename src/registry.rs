//! # Crivo Rule Registry
//!
//! Maps string identifiers to rule factories and memoizes parsed rule
//! strings. The registry is an explicit value: construct one (usually via
//! [`RuleRegistry::with_defaults`]) at startup and hand it to every
//! `Validator` that should share it. There is no hidden process-global
//! registry, so two validators only see each other's registrations when they
//! hold the same registry.
//!
//! Registration is a startup action. The parse cache lives behind a `Mutex`,
//! but `register`/`extend` take `&mut self`, which keeps concurrent mutation
//! out by construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::diagnostics::{invalid_rule, unknown_rule_bare, CrivoError};
use crate::parser;
use crate::rule::{BoxedRule, RuleFactory, RuleSpec, SharedRule};
use crate::rules_std;

/// Registry of named rule factories plus the per-registry parse cache.
///
/// The cache is keyed by the exact raw rule string (not by resolved meaning)
/// and is never invalidated: entries capture the factories resolved at first
/// parse, so re-registering an identifier affects future parses of *new*
/// strings only. It is an optimization, not a correctness requirement.
pub struct RuleRegistry {
    factories: HashMap<String, Arc<RuleFactory>>,
    cache: Mutex<HashMap<String, Vec<RuleSpec>>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("factories", &self.factories.keys())
            .finish_non_exhaustive()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RuleRegistry {
    /// An empty registry with no rules at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A registry populated with the standard rule library.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        rules_std::register_std_rules(&mut registry);
        registry
    }

    /// The standard library plus caller-supplied entries, later entries
    /// overriding earlier ones on key collision.
    pub fn extended<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<RuleFactory>)>,
    {
        let mut registry = Self::with_defaults();
        registry.extend(entries);
        registry
    }

    /// Registers a factory under an explicit identifier, overriding any
    /// existing entry.
    pub fn register<F>(&mut self, identifier: &str, factory: F)
    where
        F: Fn(&[String]) -> Result<SharedRule, CrivoError> + Send + Sync + 'static,
    {
        self.factories
            .insert(identifier.to_string(), Arc::new(factory));
    }

    /// Registers an already-constructed rule under its own declared name and
    /// returns that name. The rule must declare a non-empty name and is
    /// shared as-is; its factory rejects arguments.
    pub fn register_rule(&mut self, rule: BoxedRule) -> Result<String, CrivoError> {
        let name = rule.name().to_string();
        if name.is_empty() {
            return Err(invalid_rule(
                "rule registered without an identifier must declare a non-empty name",
            ));
        }
        let shared: SharedRule = Arc::from(rule);
        let factory_name = name.clone();
        self.register(&name, move |args: &[String]| {
            if !args.is_empty() {
                return Err(invalid_rule(format!(
                    "rule `{factory_name}` takes no arguments, got {}",
                    args.len()
                )));
            }
            Ok(Arc::clone(&shared))
        });
        Ok(name)
    }

    /// Merges caller-supplied entries; later entries win.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, Arc<RuleFactory>)>,
    {
        for (identifier, factory) in entries {
            self.factories.insert(identifier, factory);
        }
    }

    /// Looks up the factory for an identifier.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<RuleFactory>, CrivoError> {
        self.factories
            .get(identifier)
            .map(Arc::clone)
            .ok_or_else(|| unknown_rule_bare(identifier))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Parses a rule specification string, reusing the cached result for a
    /// previously seen identical string. Cache hits return clones that share
    /// the originally constructed rule objects. Parse errors are not cached.
    pub fn parse_cached(&self, spec: &str) -> Result<Vec<RuleSpec>, CrivoError> {
        if let Some(cached) = self
            .cache
            .lock()
            .expect("parse cache poisoned")
            .get(spec)
        {
            return Ok(cached.clone());
        }
        let parsed = parser::parse(self, spec)?;
        self.cache
            .lock()
            .expect("parse cache poisoned")
            .insert(spec.to_string(), parsed.clone());
        Ok(parsed)
    }
}
