//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use formchat_core::FormChatError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by handlers, rendered as a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unusable
    BadRequest(String),
    Domain(FormChatError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(err) => status_for(err),
        }
    }
}

/// HTTP status for a domain error.
pub fn status_for(err: &FormChatError) -> StatusCode {
    match err {
        FormChatError::NotFound { .. } => StatusCode::NOT_FOUND,
        FormChatError::MissingPrimaryKey { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FormChatError::Collaborator { is_retryable: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
        FormChatError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
        FormChatError::Persistence(_)
        | FormChatError::Io { .. }
        | FormChatError::Serialization { .. }
        | FormChatError::Config(_)
        | FormChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FormChatError> for ApiError {
    fn from(err: FormChatError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(message) => message.clone(),
            Self::Domain(err) => err.to_string(),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        let mut body = json!({
            "error": true,
            "message": message,
            "status": status.as_u16(),
        });
        if let Self::Domain(FormChatError::MissingPrimaryKey { fields, .. }) = &self {
            body["missing_fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
