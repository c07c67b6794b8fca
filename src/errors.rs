use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use common::ErrorResponse;
use compute::ComputeError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::ValidationErrors;

/// Every failure a handler or middleware can answer with.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request data violates a rule
    #[error("{0}")]
    Validation(String),

    /// No live row with the requested id
    #[error("{0}")]
    NotFound(String),

    /// A key field that must be unique is already taken
    #[error("{0}")]
    Conflict(String),

    /// Missing, malformed or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but the role is not allowed here
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    /// Unexpected failure outside the database
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Database(_) | ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client. Server-side failures are not
    /// described beyond a generic text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn not_found(resource: &str, id: i32) -> Self {
        ApiError::NotFound(format!("{resource} with ID {id} not found"))
    }
}

impl From<ValidationErrors> for ApiError {
    /// Keeps the first violated rule, walking fields in name order so the
    /// reported message does not depend on hash order.
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let message = fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid ({})", err.code),
                })
            })
            .unwrap_or_else(|| "Invalid request".to_string());

        ApiError::Validation(message)
    }
}

impl From<ComputeError> for ApiError {
    fn from(error: ComputeError) -> Self {
        match error {
            ComputeError::Database(db) => ApiError::Database(db),
            ComputeError::UserNotFound(id) => ApiError::not_found("User", id),
            invalid @ ComputeError::InvalidRange { .. } => ApiError::Validation(invalid.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(_) | ApiError::Internal(_) => error!("Internal service error: {}", self),
            ApiError::Conflict(_) => warn!("Conflict error: {}", self),
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => info!("Authorization error: {}", self),
            ApiError::Validation(_) | ApiError::NotFound(_) => debug!("Client error: {}", self),
        }

        let body = ErrorResponse {
            error: self.user_message(),
            code: self.code().to_string(),
            success: false,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(length(min = 3, message = "Code must have three letters"))]
        code: String,
    }

    #[test]
    fn test_first_error_follows_field_name_order() {
        let sample = Sample {
            name: String::new(),
            code: String::new(),
        };
        let err = ApiError::from(sample.validate().unwrap_err());
        assert_eq!(err.to_string(), "Code must have three letters");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::Database(DbErr::Custom("disk on fire".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_compute_errors_map_to_http_kinds() {
        let err = ApiError::from(ComputeError::UserNotFound(3));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "User with ID 3 not found");
    }
}
