//! Public API types

use std::fmt::Display;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;

// Errors

pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(msg: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", msg))
    }

    pub fn unauthorized(msg: impl Display) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!("{}", msg))
    }

    pub fn forbidden(msg: impl Display) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!("{}", msg))
    }

    pub fn not_found(msg: impl Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, anyhow::anyhow!("{}", msg))
    }

    pub fn conflict(msg: impl Display) -> Self {
        Self::new(StatusCode::CONFLICT, anyhow::anyhow!("{}", msg))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error, server side failures loudly
        if self.status.is_server_error() {
            tracing::error!("{}", self.error);
        } else {
            tracing::warn!(status = %self.status, "{}", self.error);
        }

        let message = if self.status.is_server_error() {
            format!("Something went wrong: {}", self.error)
        } else {
            self.error.to_string()
        };

        (
            self.status,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`. Anything
/// converted this way is an internal error.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

// Re-export public types from each route

pub mod admin {
    pub use crate::api::routes::admin::public::*;
}

pub mod appointments {
    pub use crate::api::routes::appointments::public::*;
}

pub mod availability {
    pub use crate::api::routes::availability::public::*;
}

pub mod employees {
    pub use crate::api::routes::employees::public::*;
}

pub mod merchants {
    pub use crate::api::routes::merchants::public::*;
}

pub mod services {
    pub use crate::api::routes::services::public::*;
}
