//! Parameter specifications and values.
//!
//! A [`ParamSpec`] is what the reflection collaborator extracts from a
//! command signature; a [`ParamValue`] is what a form (or a programmatic
//! `run`) supplies back. Both are plain serde data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supplied parameter values, keyed by parameter name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Supported parameter types.
///
/// These are the types the two channels know how to collect input for;
/// anything else is rejected by the reflection collaborator before a
/// spec reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    /// One value out of a fixed set of choices.
    Choice,
    /// A list of strings (one value per input line).
    List,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Choice => "choice",
            Self::List => "list",
        };
        write!(f, "{name}")
    }
}

/// A supplied parameter value.
///
/// Untagged on the wire so that `{"count": 3, "name": "x"}` deserializes
/// directly. Variant order matters for untagged deserialization: `Bool`
/// before `Int` before `Float` before `Str`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Returns the string content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float content; integers widen.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the list content, if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if this value is acceptable for `param_type`.
    ///
    /// Integers are acceptable where floats are expected; a choice is
    /// carried as a string (membership is checked by validation, not
    /// here).
    #[must_use]
    pub fn matches(&self, param_type: ParamType) -> bool {
        match (param_type, self) {
            (ParamType::String, Self::Str(_)) => true,
            (ParamType::Integer, Self::Int(_)) => true,
            (ParamType::Float, Self::Float(_) | Self::Int(_)) => true,
            (ParamType::Boolean, Self::Bool(_)) => true,
            (ParamType::Choice, Self::Str(_)) => true,
            (ParamType::List, Self::List(_)) => true,
            _ => false,
        }
    }

    /// Converts to a JSON value (for journal payloads and results).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Str(v) => serde_json::Value::String(v.clone()),
            Self::List(v) => serde_json::Value::from(v.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Specification for one command parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as shown on forms and flags.
    pub name: String,
    /// Type of the parameter.
    pub param_type: ParamType,
    /// Whether a value must be supplied (or defaulted).
    pub required: bool,
    /// Default value, if any.
    pub default: Option<ParamValue>,
    /// One-line help text.
    pub help: Option<String>,
    /// Valid choices, for [`ParamType::Choice`] parameters.
    pub choices: Option<Vec<String>>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: None,
            help: None,
            choices: None,
        }
    }

    /// A string parameter.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    /// An integer parameter.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    /// A float parameter.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Float)
    }

    /// A boolean parameter.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    /// A choice parameter with its allowed values.
    #[must_use]
    pub fn choice(
        name: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut spec = Self::new(name, ParamType::Choice);
        spec.choices = Some(choices.into_iter().map(Into::into).collect());
        spec
    }

    /// A list parameter (one value per input line).
    #[must_use]
    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::List)
    }

    /// Marks the parameter required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_matching() {
        assert!(ParamValue::from("x").matches(ParamType::String));
        assert!(ParamValue::from(3i64).matches(ParamType::Integer));
        assert!(ParamValue::from(3i64).matches(ParamType::Float));
        assert!(ParamValue::from(0.5).matches(ParamType::Float));
        assert!(ParamValue::from(true).matches(ParamType::Boolean));
        assert!(ParamValue::from("a").matches(ParamType::Choice));
        assert!(!ParamValue::from("x").matches(ParamType::Integer));
    }

    #[test]
    fn untagged_deserialization_keeps_types() {
        let map: ParamMap =
            serde_json::from_str(r#"{"count": 3, "name": "x", "fast": true}"#).unwrap();
        assert_eq!(map["count"], ParamValue::Int(3));
        assert_eq!(map["name"], ParamValue::Str("x".into()));
        assert_eq!(map["fast"], ParamValue::Bool(true));
    }

    #[test]
    fn builder_sets_fields() {
        let spec = ParamSpec::choice("level", ["low", "high"])
            .required()
            .with_default("low")
            .with_help("Verbosity level");
        assert_eq!(spec.param_type, ParamType::Choice);
        assert!(spec.required);
        assert_eq!(spec.default, Some(ParamValue::Str("low".into())));
        assert_eq!(spec.choices.as_deref().unwrap(), ["low", "high"]);
    }
}
