use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub response: String,
}

/// `error` is a plain message for local failures and the upstream's own JSON
/// body when relaying an upstream error.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: serde_json::Value,
}
