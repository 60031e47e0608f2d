use super::types::{ErrorResponse, TextRequest, TextResponse};
use crate::{
    Error, Result,
    error::ValidationError,
    gateway::{Inference, Task},
    normalize::normalize,
};
use axum::{
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Inference>,
}

/// Handles `/{task}/`. Checks run in a fixed order: method, body, text,
/// task. The upstream API is only contacted once all of them pass.
pub async fn process_text(
    State(state): State<AppState>,
    method: Method,
    Path(task): Path<String>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<TextResponse>> {
    if method != Method::POST {
        return Err(ValidationError::MethodNotAllowed.into());
    }

    let request: TextRequest = serde_json::from_slice(&body?)?;
    let text = request.text.unwrap_or_default();
    if text.is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let clean_text = normalize(&text);
    let task: Task = task.parse()?;

    info!(
        "Received {} request: {} chars, {} after normalization",
        task,
        text.len(),
        clean_text.len()
    );

    let output = state.gateway.infer(task, &clean_text).await?;

    info!("Completed {} request", task);
    Ok(Json(TextResponse { response: output }))
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(ValidationError::MethodNotAllowed) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::RequestBody(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            Error::Upstream { body, .. } => {
                warn!("Relaying upstream error with status {}", status);
                body
            }
            Error::Validation(e) => serde_json::Value::String(e.to_string()),
            Error::RateLimited => serde_json::Value::String(Error::RateLimited.to_string()),
            other => {
                error!("Request failed: {}", other);
                serde_json::Value::String(other.to_string())
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
