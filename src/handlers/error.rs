use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::client::ChimeError;
use crate::handlers::api::{redirect_with_notice, ResponseFormat};
use crate::hooks::ApplicationHooks;

/// Name reported as the `source` of every error body
pub const ERROR_SOURCE: &str = "chime_meeting_service";

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: u16,
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub source: &'static str,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: &str, error_type: String) -> Self {
        Self {
            source: ERROR_SOURCE,
            error: ErrorInfo {
                code: status.as_u16(),
                message: message.to_string(),
                error_type,
            },
        }
    }
}

/// A failed request, rendered as a JSON error body or, for browser clients, a
/// redirect with a notice
#[derive(Debug)]
pub struct ApiError {
    error: ChimeError,
    redirect_to: Option<String>,
}

impl ApiError {
    pub fn json(error: ChimeError) -> Self {
        Self {
            error,
            redirect_to: None,
        }
    }

    pub fn redirect(error: ChimeError, path: String) -> Self {
        Self {
            error,
            redirect_to: Some(path),
        }
    }

    /// Choose the rendering from the negotiated format; browsers go back to the meetings index
    pub fn respond(error: ChimeError, format: ResponseFormat, hooks: &dyn ApplicationHooks) -> Self {
        match format {
            ResponseFormat::Html => Self::redirect(error, hooks.meeting_resources_path()),
            ResponseFormat::Json => Self::json(error),
        }
    }

    /// Status and message for the errors recovered here; `None` for everything else
    fn translate(&self) -> Option<(StatusCode, &'static str)> {
        match self.error {
            ChimeError::Forbidden(_) => Some((StatusCode::FORBIDDEN, "Forbidden")),
            ChimeError::NotFound(_) | ChimeError::Validation(_) => {
                Some((StatusCode::NOT_FOUND, "Resource not found"))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_type = self.error.to_string();

        match self.translate() {
            Some((status, message)) => {
                warn!("{}: {}", message, error_type);
                match self.redirect_to {
                    Some(path) => {
                        redirect_with_notice(&path, &format!("{}: {}", message, error_type))
                    }
                    None => (
                        status,
                        Json(ErrorResponse::new(status, message, error_type)),
                    )
                        .into_response(),
                }
            }
            None => {
                error!("Unhandled meeting provider error: {}", self.error);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    Json(ErrorResponse::new(status, "Internal server error", error_type)),
                )
                    .into_response()
            }
        }
    }
}
