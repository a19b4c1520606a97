//! Wire response encoding.

use serde::{Deserialize, Serialize};

/// Body returned for every recognised invocation request.
///
/// `Result` holds the handler's return value already encoded as JSON text, so
/// it appears on the wire as a JSON string containing JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    /// JSON text of the return value; empty on failure.
    pub result: String,
    /// Whether the handler ran to completion.
    pub success: bool,
    /// Error description; empty on success.
    #[serde(default)]
    pub error: String,
    /// Captured console output; empty unless capture was requested.
    #[serde(default)]
    pub output: String,
}

impl InvocationResponse {
    /// Successful invocation.
    #[must_use]
    pub fn success(result: String, output: String) -> Self {
        Self {
            result,
            success: true,
            error: String::new(),
            output,
        }
    }

    /// Failed invocation.
    #[must_use]
    pub fn failure(error: String, output: String) -> Self {
        Self {
            result: String::new(),
            success: false,
            error,
            output,
        }
    }

    /// Serialises the response body.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
