use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub const SUBSCRIPTION_NOT_FOUND: &str = "Subscription id not found";
pub const USER_NOT_FOUND: &str = "User id not found";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("{0}")]
    ValidationError(String),

    #[error("invalid date format, expected MM-YYYY: {0}")]
    InvalidDateFormat(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn subscription_not_found() -> Self {
        AppError::NotFound(SUBSCRIPTION_NOT_FOUND.to_string())
    }

    pub fn user_not_found() -> Self {
        AppError::NotFound(USER_NOT_FOUND.to_string())
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message exposed to API clients. Storage and internal failures are opaque.
    pub fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidDateFormat(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message() }))
    }
}
