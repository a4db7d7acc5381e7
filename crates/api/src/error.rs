//! `ApiError`: every failure a handler can return, mapped onto HTTP.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use engine::{EngineError, ValidationError};
use ontology::OntologyError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session.
    #[error("authentication required")]
    Unauthorized,

    /// Wrong email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("too many login attempts, try again later")]
    TooManyAttempts { retry_after_secs: u64 },

    /// Authenticated, but asking for something the session does not cover.
    #[error("{0}")]
    Forbidden(String),

    #[error("a tenant must be selected for this request")]
    MissingTenant,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] OntologyError),

    #[error("database error: {0}")]
    Db(#[from] db::DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(v) => ApiError::Validation(v),
            EngineError::Backend(b) => ApiError::Backend(b),
            EngineError::NotOnCanvas(id) => ApiError::NotFound(id),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::MissingTenant | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Backend(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user.  Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Backend(err) => err.user_message(),
            ApiError::Db(_) | ApiError::Internal(_) => OntologyError::FALLBACK_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }

        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();
        if let ApiError::TooManyAttempts { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::NodeType;

    #[test]
    fn validation_errors_are_unprocessable() {
        let err = ApiError::from(EngineError::Validation(ValidationError::IntegrationNotADestination));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("integration"));

        let err = ApiError::from(ValidationError::InvalidSourceType(NodeType::from("robot")));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn backend_status_passes_through() {
        let err = ApiError::from(OntologyError::Backend { status: 409, message: Some("dup".into()) });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "dup");

        let err = ApiError::from(OntologyError::Transport("refused".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), OntologyError::FALLBACK_MESSAGE);
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = ApiError::TooManyAttempts { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
