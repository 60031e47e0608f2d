use super::types::*;
use crate::{Error, Result, config::UpstreamConfig};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait Inference: Send + Sync {
    /// Runs `task` over `text` and returns the generated text.
    async fn infer(&self, task: Task, text: &str) -> Result<String>;
}

/// Client for the hosted inference API. One instance is shared by every
/// request; the underlying connection pool is reused.
pub struct HuggingFaceGateway {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HuggingFaceGateway {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| {
            Error::config("API key contains characters not allowed in a header")
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout())
        } else {
            Error::Network(e)
        }
    }
}

#[async_trait]
impl Inference for HuggingFaceGateway {
    async fn infer(&self, task: Task, text: &str) -> Result<String> {
        let url = self.config.endpoints.url_for(task);
        let payload = UpstreamPayload {
            inputs: task.build_input(text),
        };

        debug!(
            "Calling {} endpoint {} with {} input chars",
            task,
            url,
            payload.inputs.len()
        );

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!("Upstream {} endpoint returned {}", task, status);
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: error_body(&body),
            });
        }

        let text = decode_output(&body)?;
        debug!("Upstream {} endpoint returned {} chars", task, text.len());
        Ok(text)
    }
}

/// Upstream error bodies are relayed as-is when they are JSON; anything else
/// is wrapped as a JSON string.
fn error_body(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
    })
}

/// Decodes a success body: a JSON array whose first element carries the text.
pub fn decode_output(body: &[u8]) -> Result<String> {
    let records: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| Error::malformed(e.to_string()))?;

    // Only the first element is inspected; later elements may have any shape.
    let first = records
        .into_iter()
        .next()
        .ok_or_else(|| Error::malformed("upstream returned an empty array"))?;
    let first: OutputRecord =
        serde_json::from_value(first).map_err(|e| Error::malformed(e.to_string()))?;

    first.into_generated().map(GeneratedText::into_text).ok_or_else(|| {
        Error::malformed(
            "first element has none of summary_text, translation_text, generated_text",
        )
    })
}
