//! Mapping of engine errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_common::Error;
use serde_json::json;
use tracing::{error, warn};

/// Handler error carrying a roster error
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ConfirmationRequired(_) | Error::SaveInProgress => StatusCode::CONFLICT,
            Error::Save { .. } | Error::Load(_) | Error::Store(_) | Error::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!("Request failed: {}", self.0),
            StatusCode::NOT_FOUND => warn!("{}", self.0),
            _ => {}
        }

        let mut body = json!({ "error": self.0.to_string() });
        if let Error::Save { entity, .. } = &self.0 {
            body["entity"] = json!(entity);
        }

        (status, Json(body)).into_response()
    }
}
