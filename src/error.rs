use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures raised while scoring a candidate batch
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Model produced a non-finite prediction for anime {anime_id}")]
    InvalidPrediction { anime_id: u64 },

    #[error("Inference timed out after {0} ms")]
    Timeout(u64),

    #[error("Inference task aborted: {0}")]
    Aborted(String),

    #[error("Model failure: {0}")]
    Model(String),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Catalog load error: {0}")]
    DataLoad(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Inference(InferenceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Inference(_) => StatusCode::BAD_GATEWAY,
            AppError::DataLoad(_) | AppError::ModelLoad(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
