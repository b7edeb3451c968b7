use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("{0}")]
    Auth(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(_) | AppError::CorruptRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::SignatureInvalid | AppError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        // Store internals stay in the log.
        let body = match self {
            AppError::Store(_) | AppError::CorruptRecord(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}
