use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::debug;

use crate::model::api::ErrorDto;

/// Rejections produced by the dynamic request guards.
#[derive(Error, Debug)]
pub enum InterceptError {
    /// The client IP matched an entry of the IP blocklist.
    ///
    /// Results in a 403 Forbidden response.
    #[error("Request from blocked IP {0}")]
    BlockedIp(String),

    /// The session interceptor is active and neither the account nor the route is allowed.
    ///
    /// Results in a 503 Service Unavailable response carrying the operator message.
    #[error("Session intercepted: {message}")]
    SessionIntercepted {
        /// Message configured by the operator, returned to the client verbatim
        message: String,
    },

    /// The route is over its configured concurrency ceiling.
    ///
    /// Results in a 429 Too Many Requests response.
    #[error("Too many concurrent requests for {key} ({current}/{max})")]
    TooManyRequests {
        /// Routing key of the limited route
        key: String,
        /// In-flight count including the rejected request
        current: u32,
        /// Configured ceiling
        max: u32,
    },
}

/// Converts interception rejections into HTTP responses.
///
/// # Returns
/// - 403 Forbidden - For `BlockedIp`
/// - 429 Too Many Requests - For `TooManyRequests`
/// - 503 Service Unavailable - For `SessionIntercepted`, with the configured message
impl IntoResponse for InterceptError {
    fn into_response(self) -> Response {
        debug!("{}", self);

        match self {
            Self::BlockedIp(_) => (
                StatusCode::FORBIDDEN,
                Json(ErrorDto {
                    error: "Access denied".to_string(),
                }),
            )
                .into_response(),
            Self::SessionIntercepted { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorDto { error: message }),
            )
                .into_response(),
            Self::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorDto {
                    error: "Too many requests, please try again later".to_string(),
                }),
            )
                .into_response(),
        }
    }
}
