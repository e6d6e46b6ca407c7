use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for API responses that adds the `{ "success": true, ... }` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: None, // Default to 200 OK
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: Some(StatusCode::CREATED),
            ..Self::success(data)
        }
    }

    /// Attach a human-readable message next to the data
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// A 200 response carrying only a message
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = json!({ "success": true });

        if let Some(message) = self.message {
            envelope["message"] = json!(message);
        }

        if let Some(data) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
