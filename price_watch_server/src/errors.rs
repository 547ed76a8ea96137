use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use price_watch_engine::WatchApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("The pw_user_id header is missing or invalid")]
    MissingIdentity,
    #[error("The scan key is missing or incorrect")]
    InvalidScanKey,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    WatchError(#[from] WatchApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::MissingIdentity => StatusCode::UNAUTHORIZED,
            Self::InvalidScanKey => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::WatchError(e) => match e {
                WatchApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
                WatchApiError::AuthorizationError(_) => StatusCode::FORBIDDEN,
                WatchApiError::NotFound(_) => StatusCode::NOT_FOUND,
                WatchApiError::StateError(_) | WatchApiError::ConflictError(_) => StatusCode::CONFLICT,
                WatchApiError::UnavailableError(_) => StatusCode::SERVICE_UNAVAILABLE,
                WatchApiError::ReconciliationAnomaly(_) | WatchApiError::DatabaseError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
