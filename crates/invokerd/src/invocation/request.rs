//! Wire request decoding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DecodeError;

/// Decoded invocation request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    /// Handler spec, `Module` or `Module::method`.
    pub handler: String,
    /// Directory holding the user module and its archives.
    #[serde(alias = "HandlerDir")]
    pub module_dir: PathBuf,
    /// Parameters passed to the handler untouched.
    #[serde(default)]
    pub params: Value,
    /// Whether console output is captured and returned.
    #[serde(default)]
    pub return_output: bool,
}

impl InvocationRequest {
    /// Parses a UTF-8 JSON request body.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(body).map_err(|source| DecodeError::Body { source })
    }
}
