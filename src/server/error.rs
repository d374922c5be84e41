use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;

use crate::error::{ErrorClass, LaunchError};

/// Error body returned by every endpoint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&LaunchError> for ErrorBody {
    fn from(e: &LaunchError) -> Self {
        let message = match e.class() {
            // Backend details stay in the logs
            ErrorClass::Transient | ErrorClass::Internal => "Temporary server error, retry shortly".to_string(),
            _ => e.to_string(),
        };
        Self {
            error: e.code(),
            message,
            retryable: e.is_retryable(),
        }
    }
}

impl IntoResponse for LaunchError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("{} ({}): {}", status, self.error_code(), self);
        }

        let mut response = (status, Json(ErrorBody::from(&self))).into_response();
        if let LaunchError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}
