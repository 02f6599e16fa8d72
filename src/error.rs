use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::repo::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Request-boundary errors. Persistence failures carry only a caller-facing
/// message; the cause is logged where the error is raised.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")] Validation(&'static str),
    /// The document kept changing under us; retrying later may succeed.
    #[error("{0}")] Conflict(&'static str),
    #[error("{0}")] Persistence(&'static str),
}

impl ApiError {
    /// Log `cause` and turn it into the generic failure for `what`.
    pub fn from_repo(cause: RepoError, what: &'static str) -> Self {
        log::error!("{what}: {cause}");
        if cause.is_retryable() {
            ApiError::Conflict(what)
        } else {
            ApiError::Persistence(what)
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) | ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut resp = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::Conflict(_)) {
            resp.insert_header((actix_web::http::header::RETRY_AFTER, "1"));
        }
        resp.json(ApiErrorBody { error: self.to_string() })
    }
}
