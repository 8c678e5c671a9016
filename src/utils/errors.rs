use actix_web::{HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::api::ErrorResponse;

/// Failures of a call to the remote Task API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Task API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Task {0} not found")]
    NotFound(i32),

    #[error("Task API unavailable: {0}")]
    Unavailable(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub enum ServiceError {
    NotFound(String),
    ValidationError(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::NotFound(msg) => {
                log::error!("Not Found: {}", msg);
                HttpResponse::NotFound().json(ErrorResponse {
                    status: "error".to_string(),
                    message: msg.clone(),
                })
            }
            ServiceError::ValidationError(msg) => {
                log::error!("Validation Error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    status: "error".to_string(),
                    message: msg.clone(),
                })
            }
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    use crate::models::task::TaskUpdate;

    #[test]
    fn not_found_keeps_its_message() {
        let err = ServiceError::NotFound("No task at index 3 in column Completed".into());
        assert_eq!(err.to_string(), "Not Found: No task at index 3 in column Completed");
        assert_eq!(err.error_response().status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_update_is_a_bad_request() {
        let update = TaskUpdate {
            title: Some(String::new()),
            ..TaskUpdate::default()
        };
        let err: ServiceError = update.validate().unwrap_err().into();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert_eq!(err.error_response().status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
