// Application error type and its conversion into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::dealer_api::ApiError;

#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    // The dealer API could not serve the request
    Upstream(ApiError),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        AppError::Upstream(error)
    }
}

impl From<askama::Error> for AppError {
    fn from(error: askama::Error) -> Self {
        AppError::InternalServerError(anyhow::Error::new(error).context("Failed to render template"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Upstream(e) => {
                tracing::warn!(error = %e, "Dealer API request failed");
                (StatusCode::BAD_GATEWAY, "Failed to load cars".to_string())
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
