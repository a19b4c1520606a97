//! Execution context handed to two-parameter handlers.

use std::env::{self, VarError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DecodeError;

/// String-keyed JSON document describing the execution environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext(Map<String, Value>);

impl ExecutionContext {
    /// Reads and parses the context from the environment variable `variable`.
    ///
    /// An unset or empty variable yields an empty context.
    pub fn from_env(variable: &str) -> Result<Self, DecodeError> {
        match env::var(variable) {
            Ok(document) => Self::from_document(variable, &document),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(DecodeError::ContextEncoding {
                variable: variable.to_owned(),
            }),
        }
    }

    fn from_document(variable: &str, document: &str) -> Result<Self, DecodeError> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }
        let value = serde_json::from_str(document).map_err(|source| DecodeError::Context {
            variable: variable.to_owned(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DecodeError::ContextNotObject {
                variable: variable.to_owned(),
                found: json_type(&other),
            }),
        }
    }

    /// Builds a context from a JSON value; anything but an object is empty.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Looks up `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the context has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the context into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ExecutionContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
