//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::settings::SettingsError;

#[derive(Debug)]
pub enum ApiError {
    /// A settings update was rejected.
    Settings(SettingsError),
}

/// JSON body returned on error.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Settings(SettingsError::UnknownKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Settings(SettingsError::OutOfRange { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Settings(SettingsError::InvalidValue { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: match &self {
                ApiError::Settings(e) => e.to_string(),
            },
            code: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        ApiError::Settings(e)
    }
}
