// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::notes::NoteError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

impl ApiError {
    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::unauthorized(err.to_string())
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        let display = err.to_string();
        match err {
            NoteError::Validation { message, field_errors } => {
                let field_errors = (!field_errors.is_empty()).then_some(field_errors);
                ApiError::validation_error(message, field_errors)
            }
            NoteError::NotFound => ApiError::not_found(display),
            NoteError::Forbidden(_) => ApiError::forbidden(display),
            // Already logged and sanitised by the guard
            NoteError::Store(message) => ApiError::internal_server_error(message),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::NoteAction;

    #[test]
    fn note_errors_map_to_status_classes() {
        let cases: Vec<(NoteError, u16, &str)> = vec![
            (
                NoteError::Validation { message: "bad".into(), field_errors: HashMap::new() },
                400,
                "VALIDATION_ERROR",
            ),
            (NoteError::NotFound, 404, "NOT_FOUND"),
            (NoteError::Forbidden(NoteAction::Delete), 403, "FORBIDDEN"),
            (NoteError::Store("Error deleting note".into()), 500, "INTERNAL_SERVER_ERROR"),
        ];

        for (note_error, status, code) in cases {
            assert_eq!(note_error.status_code(), status);
            let api_error = ApiError::from(note_error);
            assert_eq!(api_error.status_code(), status);
            assert_eq!(api_error.error_code(), code);
        }
    }

    #[test]
    fn auth_errors_are_all_unauthorized_with_distinct_messages() {
        let messages: Vec<String> = [AuthError::MissingCredential, AuthError::Expired, AuthError::Invalid]
            .into_iter()
            .map(|e| {
                let api_error = ApiError::from(e);
                assert_eq!(api_error.status_code(), 401);
                api_error.message().to_string()
            })
            .collect();

        assert_eq!(messages[0], "No token provided. Please authenticate.");
        assert_eq!(messages[1], "Token has expired");
        assert_eq!(messages[2], "Invalid token");
    }

    #[test]
    fn forbidden_message_names_the_action() {
        let api_error = ApiError::from(NoteError::Forbidden(NoteAction::Update));
        assert_eq!(api_error.message(), "Not authorized to update this note");
        assert_eq!(api_error.to_json()["success"], false);
    }

    #[test]
    fn validation_json_includes_field_errors() {
        let mut field_errors = HashMap::new();
        field_errors.insert("title".to_string(), "Please provide a title".to_string());
        let json = ApiError::validation_error("Please provide title and content", Some(field_errors)).to_json();
        assert_eq!(json["field_errors"]["title"], "Please provide a title");
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}
