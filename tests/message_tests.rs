//! Message override selection through a full validation run: specificity,
//! declaration order, positional keys, and the default fallback.

use crivo::{
    messages::default_message, BoxedRule, DataMap, MessageOverrides, Rule, RuleSet, Rules,
    Validator, Value, Verdict,
};

fn data(pairs: &[(&str, Value)]) -> DataMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn violation_code_override_is_selected() {
    let mut validator = Validator::new(
        data(&[("name", Value::from("not-an-email"))]),
        Rules::new().field("name", "email"),
    )
    .unwrap()
    .with_messages(
        MessageOverrides::new()
            .message("name", "Required")
            .message("name.email.format", "Bad format"),
    );
    assert!(!validator.validate());
    let messages = validator.errors().get("name").unwrap();
    assert!(messages.contains(&"Bad format".to_string()));
}

#[test]
fn rule_level_override_covers_every_code() {
    let mut validator = Validator::new(
        data(&[("name", Value::from("not-an-email"))]),
        Rules::new().field("name", "email"),
    )
    .unwrap()
    .with_messages(MessageOverrides::new().message("name.email", "Invalid"));
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("name").unwrap(),
        &["Invalid".to_string()]
    );
}

#[test]
fn generic_and_specific_overrides_both_surface() {
    let mut validator = Validator::new(
        data(&[("name", Value::from("not-an-email"))]),
        Rules::new().field("name", "email"),
    )
    .unwrap()
    .with_messages(
        MessageOverrides::new()
            .message("name.email", "Invalid")
            .message("name.email.format", "Bad format"),
    );
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("name").unwrap(),
        &["Invalid".to_string(), "Bad format".to_string()]
    );
}

#[test]
fn codeless_failure_uses_attribute_override() {
    // `required` reports no violation codes.
    let mut validator = Validator::new(
        data(&[("name", Value::Null)]),
        Rules::new().field("name", "required"),
    )
    .unwrap()
    .with_messages(MessageOverrides::new().message("name", "Name is required"));
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("name").unwrap(),
        &["Name is required".to_string()]
    );
}

#[test]
fn unmatched_failures_fall_back_to_the_default_message() {
    let mut validator = Validator::new(
        data(&[("name", Value::Null)]),
        Rules::new().field("name", "required"),
    )
    .unwrap();
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("name").unwrap(),
        &[default_message("name")]
    );
}

#[test]
fn anonymous_callables_key_by_position() {
    struct Anon;
    impl Rule for Anon {
        fn name(&self) -> &str {
            ""
        }
        fn check(&self, _value: &Value) -> Verdict {
            Verdict::fail_bare()
        }
    }
    let factory = |_value: &Value| -> BoxedRule { Box::new(Anon) };

    let mut validator = Validator::new(
        data(&[("field", Value::from("x"))]),
        Rules::new().field(
            "field",
            RuleSet::Many(vec![
                crivo::RuleSpec::callable(factory),
                crivo::RuleSpec::callable(factory),
            ]),
        ),
    )
    .unwrap()
    .with_messages(
        MessageOverrides::new()
            .message("field.0", "first anonymous failure")
            .message("field.1", "second anonymous failure"),
    );
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("field").unwrap(),
        &[
            "first anonymous failure".to_string(),
            "second anonymous failure".to_string()
        ]
    );
}

#[test]
fn multiple_failing_rules_accumulate_in_order() {
    let mut validator = Validator::new(
        data(&[("pwd", Value::from("a!"))]),
        Rules::new().field("pwd", "min:8|alpha_num"),
    )
    .unwrap()
    .with_messages(
        MessageOverrides::new()
            .message("pwd.min.string", "too short")
            .message("pwd.alpha_num.format", "letters and digits only"),
    );
    assert!(!validator.validate());
    assert_eq!(
        validator.errors().get("pwd").unwrap(),
        &[
            "too short".to_string(),
            "letters and digits only".to_string()
        ]
    );
}
