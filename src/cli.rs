//!
//! This module is the main entry point for the `crivo` binary and
//! orchestrates the core library functions: load JSON data and rules, run
//! the validator, and report failures.

use std::io::Write;
use std::{path::Path, path::PathBuf, process};

use clap::{Parser, Subcommand};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    diagnostics::print_error,
    engine::{data_from_json, Validator},
    messages::MessageOverrides,
    normalize::Rules,
    registry::RuleRegistry,
};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "crivo",
    version,
    about = "A declarative, extensible validation engine for named input data."
)]
pub struct CrivoArgs {
    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Validate a JSON data file against a JSON rules mapping.
    Check {
        /// JSON file with the data object to validate.
        #[arg(required = true)]
        data: PathBuf,
        /// JSON file mapping attribute names to rule strings.
        #[arg(required = true)]
        rules: PathBuf,
        /// JSON file mapping override keys to messages.
        #[arg(long)]
        messages: Option<PathBuf>,
        /// Stop the entire run at the first failing attribute.
        #[arg(long)]
        bail: bool,
        /// Emit the error collection as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List all registered rule identifiers.
    ListRules,
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI. Exit code 0 means the data validated.
pub fn run() {
    let args = CrivoArgs::parse();

    match args.command {
        ArgsCommand::Check {
            data,
            rules,
            messages,
            bail,
            json,
        } => {
            let passed = check(&data, &rules, messages.as_deref(), bail, json);
            if !passed {
                process::exit(1);
            }
        }

        ArgsCommand::ListRules => {
            let registry = RuleRegistry::with_defaults();
            let mut identifiers = registry.identifiers();
            identifiers.sort();
            for identifier in identifiers {
                println!("{identifier}");
            }
        }
    }
}

fn check(
    data_path: &Path,
    rules_path: &Path,
    messages_path: Option<&Path>,
    bail: bool,
    json: bool,
) -> bool {
    let data = data_from_json(read_json_or_exit(data_path));
    let rules = rules_from_json(read_json_or_exit(rules_path));
    let messages = match messages_path {
        Some(path) => messages_from_json(read_json_or_exit(path)),
        None => MessageOverrides::new(),
    };

    let mut validator = Validator::new(data, rules)
        .unwrap_or_else(|e| {
            print_error(e);
            process::exit(2);
        })
        .with_messages(messages);
    validator.stop_on_first_failure(bail);

    let passed = validator.validate();
    if json {
        println!("{}", report_json(passed, &validator));
    } else {
        print_report(passed, &validator);
    }
    passed
}

// ============================================================================
// INPUT LOADING
// ============================================================================

fn read_json_or_exit(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {e}", path.display());
        process::exit(2);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Failed to parse {} as JSON: {e}", path.display());
        process::exit(2);
    })
}

// A rules file is a JSON object mapping attribute names to rule strings.
// Object order is attribute declaration order (and thus execution order).
fn rules_from_json(json: serde_json::Value) -> Rules {
    let mut rules = Rules::new();
    match json {
        serde_json::Value::Object(map) => {
            for (attribute, spec) in map {
                match spec {
                    serde_json::Value::String(spec) => {
                        rules = rules.field(&attribute, spec.as_str());
                    }
                    other => {
                        eprintln!(
                            "Rules for `{attribute}` must be a string, got {other}"
                        );
                        process::exit(2);
                    }
                }
            }
        }
        _ => {
            eprintln!("Rules file must be a JSON object of attribute -> rule string");
            process::exit(2);
        }
    }
    rules
}

fn messages_from_json(json: serde_json::Value) -> MessageOverrides {
    match json {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(text) => Some((key, text)),
                _ => None,
            })
            .collect(),
        _ => {
            eprintln!("Messages file must be a JSON object of override key -> message");
            process::exit(2);
        }
    }
}

// ============================================================================
// REPORTING
// ============================================================================

#[derive(serde::Serialize)]
struct JsonReport {
    ok: bool,
    errors: serde_json::Value,
}

fn report_json(passed: bool, validator: &Validator) -> String {
    let report = JsonReport {
        ok: passed,
        errors: validator.errors().to_json(),
    };
    serde_json::to_string_pretty(&report).expect("report serializes")
}

fn print_report(passed: bool, validator: &Validator) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if passed {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(stdout, "ok");
        let _ = stdout.reset();
        return;
    }

    for (attribute, messages) in validator.errors().iter() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = write!(stdout, "{attribute}");
        let _ = stdout.reset();
        let _ = writeln!(stdout, ":");
        for message in messages {
            let _ = writeln!(stdout, "  - {message}");
        }
    }
    let total = validator.errors().len();
    let _ = writeln!(stdout, "{total} validation error(s)");
}
