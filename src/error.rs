use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Weather API error: {0}")]
    WeatherApi(String),
    #[error("Language model error: {0}")]
    LanguageModel(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadGateway(String),
    /// A dependency failed; `message` is shown to the client, `detail` is the cause.
    #[error("{message}: {detail}")]
    Dependency { message: String, detail: String },
}

impl AppError {
    pub fn dependency(message: &str, cause: impl std::fmt::Display) -> Self {
        AppError::Dependency {
            message: message.to_string(),
            detail: cause.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Dependency { message, detail } => serde_json::json!({
                "message": message,
                "error": detail
            }),
            _ => serde_json::json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Returns the first human-readable message out of a failed `validate()` call.
pub fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
