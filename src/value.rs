use im::HashMap;

/// Represents an input value under validation.
///
/// `Null` doubles as the absent marker: an attribute missing from the data
/// mapping validates exactly like an attribute explicitly set to `Null`.
///
/// # Examples
///
/// ```rust
/// use crivo::value::Value;
/// let n = Value::Number(3.14);
/// assert_eq!(n.type_name(), "Number");
/// let s = Value::from("hello");
/// assert_eq!(s.type_name(), "String");
/// let null = Value::default();
/// assert!(null.is_empty_input());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Returns the type name of the value as a string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use crivo::value::Value;
    /// let v = Value::Bool(true);
    /// assert_eq!(v.type_name(), "Bool");
    /// ```
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Returns true for the two empty input forms: `Null` and the empty
    /// string. Exact-match semantics; `"  "` is not empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use crivo::value::Value;
    /// assert!(Value::Null.is_empty_input());
    /// assert!(Value::from("").is_empty_input());
    /// assert!(!Value::from("  ").is_empty_input());
    /// assert!(!Value::Number(0.0).is_empty_input());
    /// ```
    pub fn is_empty_input(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the contained string if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained number if this is a Number value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use crivo::value::Value;
    /// assert_eq!(Value::Number(2.0).as_number(), Some(2.0));
    /// assert_eq!(Value::from("nope").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained bool if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts to a `serde_json::Value`, mapping `Null` back to JSON null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn json_round_trips_structure() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"name":"ada","tags":["a","b"],"age":36.5,"bio":null}"#)
                .unwrap();
        let value = Value::from(json.clone());
        match &value {
            Value::Map(map) => {
                assert_eq!(map.get("name"), Some(&Value::from("ada")));
                assert_eq!(map.get("bio"), Some(&Value::Null));
            }
            other => panic!("expected Map, got {}", other.type_name()),
        }
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn empty_input_is_exact_match() {
        assert!(Value::from("").is_empty_input());
        assert!(!Value::from(" ").is_empty_input());
        assert!(!Value::List(vec![]).is_empty_input());
    }
}
