use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use zipline_core::{ServiceError, StoreError};

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures surfaced over HTTP as `{ "status", "message" }` bodies.
#[derive(Debug)]
pub enum AppError {
    /// Failure reported by the URL service, mapped by variant.
    Service(ServiceError),
    /// The request was malformed before it reached the service.
    BadRequest(String),
    /// The endpoint requires a caller identity and none was given.
    MissingCaller,
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            Self::Service(ServiceError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Store(e)) => match e {
                StoreError::Unavailable(_) | StoreError::Timeout(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                StoreError::Query(_) | StoreError::InvalidData(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingCaller => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Service(e) => e.to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::MissingCaller => "this endpoint requires an authenticated caller".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(status = status.as_u16(), message = %message, "request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
