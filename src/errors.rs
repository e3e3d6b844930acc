use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Aucun CSV trouve. Attendu: {} ou {}", .processed.display(), .raw.display())]
    DataNotFound { processed: PathBuf, raw: PathBuf },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Model error: {0}")]
    Model(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::DataNotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::InsufficientData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()).into_response()
            }
            AppError::Csv(_) | AppError::Io(_) | AppError::Model(_) => {
                tracing::error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_both_paths() {
        let err = AppError::DataNotFound {
            processed: PathBuf::from("data/processed/maize_prices_monthly.csv"),
            raw: PathBuf::from("data/raw/producer-prices_ben.csv"),
        };
        let msg = err.to_string();
        assert!(msg.contains("maize_prices_monthly.csv"));
        assert!(msg.contains("producer-prices_ben.csv"));
    }

    #[test]
    fn test_status_codes() {
        let validation = AppError::Validation("bad horizon".to_string()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let model = AppError::Model("singular".to_string()).into_response();
        assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
