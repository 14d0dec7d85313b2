use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use models::errors::ModelError;
use service::auth::AuthError;
use service::errors::ServiceError;

/// JSON error envelope: `{"error", "message", "code", "fields"?}`.
#[derive(Debug)]
pub struct JsonApiError {
    status: StatusCode,
    title: &'static str,
    message: Option<String>,
    code: u16,
    fields: Vec<&'static str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, message: Option<String>) -> Self {
        Self { status, title, message, code: 0, fields: Vec::new() }
    }

    /// Extractor rejection, titled by its status.
    pub fn rejected(status: StatusCode, message: String, code: u16) -> Self {
        let title = status.canonical_reason().unwrap_or("Bad Request");
        Self::new(status, title, Some(message)).with_code(code)
    }

    pub fn unauthenticated() -> Self {
        ServiceError::Unauthenticated.into()
    }

    fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = self.code, message = ?self.message, "request failed");
        } else {
            warn!(status = %self.status, code = self.code, message = ?self.message, "request rejected");
        }
        let mut body = serde_json::json!({
            "error": self.title,
            "message": self.message,
            "code": self.code,
        });
        if !self.fields.is_empty() {
            body["fields"] = serde_json::json!(self.fields);
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let code = e.code();
        let err = match &e {
            AuthError::Validation(_) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string())),
            AuthError::AlreadyExists => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(e.to_string())),
            AuthError::InvalidCredentials | AuthError::TokenError(_) => {
                JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(e.to_string()))
            }
            AuthError::HashError(_) | AuthError::Storage(_) => {
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(e.to_string()))
            }
        };
        err.with_code(code)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        let mut err = match &e {
            ServiceError::Unauthenticated => JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(e.to_string())),
            ServiceError::Validation(_) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string())),
            ServiceError::NotFound(_) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(e.to_string())),
            ServiceError::Forbidden(_) => JsonApiError::new(StatusCode::FORBIDDEN, "Forbidden", Some(e.to_string())),
            ServiceError::Storage(_) => {
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(e.to_string()))
            }
        };
        if let ServiceError::Validation(ModelError::MissingFields(fields)) = e {
            err.fields = fields;
        }
        err.with_code(code)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}
