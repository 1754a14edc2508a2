//! Class-list normalization.
//!
//! Callers hand over class lists in whatever shape is convenient: a plain
//! string, nested sequences, or a conditional `class -> enabled` mapping.
//! Everything is reduced to one space-separated string so that equivalent
//! inputs share a cache key.

use serde_json::Value;

use crate::stylesheet::collapse_whitespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassInput {
    Raw(String),
    Nested(Vec<ClassInput>),
    Conditional(Vec<(String, bool)>),
}

impl ClassInput {
    /// Builds an input from a JSON value. Object entries are kept when their
    /// value is truthy; unsupported values become an empty input.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => ClassInput::Raw(s.clone()),
            Value::Array(items) => ClassInput::Nested(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => ClassInput::Conditional(
                map.iter()
                    .map(|(k, v)| (k.clone(), is_truthy(v)))
                    .collect(),
            ),
            _ => ClassInput::Raw(String::new()),
        }
    }
}

impl From<&str> for ClassInput {
    fn from(value: &str) -> Self {
        ClassInput::Raw(value.to_string())
    }
}

impl From<String> for ClassInput {
    fn from(value: String) -> Self {
        ClassInput::Raw(value)
    }
}

impl<T: Into<ClassInput>> From<Vec<T>> for ClassInput {
    fn from(value: Vec<T>) -> Self {
        ClassInput::Nested(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, bool); N]> for ClassInput {
    fn from(value: [(K, bool); N]) -> Self {
        ClassInput::Conditional(value.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Normalizes a variadic class argument list. The first argument decides how
/// the list is read.
pub fn format_class_list(params: &[ClassInput]) -> String {
    let joined = match params.first() {
        Some(ClassInput::Raw(s)) => s.clone(),
        Some(ClassInput::Nested(_)) => {
            let mut leaves = Vec::new();
            flatten_into(params, &mut leaves);
            leaves
                .into_iter()
                .map(|leaf| format_class_list(std::slice::from_ref(leaf)))
                .collect::<Vec<_>>()
                .join(" ")
        }
        Some(ClassInput::Conditional(entries)) => entries
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    };

    collapse_whitespace(&joined)
}

fn flatten_into<'a>(items: &'a [ClassInput], out: &mut Vec<&'a ClassInput>) {
    for item in items {
        match item {
            ClassInput::Nested(inner) => flatten_into(inner, out),
            leaf => out.push(leaf),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
