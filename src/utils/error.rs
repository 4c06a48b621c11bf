use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No names provided")]
    NoNamesProvided,

    #[error("No file part")]
    MissingUploadFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Malformed upload: {message}")]
    MalformedUpload { message: String },

    #[error("Invalid dataset: {message}")]
    FormatError { message: String },

    #[error("Corrupt token: {message}")]
    CorruptTokenError { message: String },

    #[error("Fixture error: {message}")]
    FixtureError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Data,
    Configuration,
    System,
}

impl AppError {
    pub fn format(message: impl Into<String>) -> Self {
        AppError::FormatError {
            message: message.into(),
        }
    }

    pub fn corrupt_token(message: impl Into<String>) -> Self {
        AppError::CorruptTokenError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::NoNamesProvided
            | AppError::MissingUploadFile
            | AppError::EmptyFilename
            | AppError::PayloadTooLarge
            | AppError::MalformedUpload { .. } => ErrorCategory::Request,
            AppError::FormatError { .. }
            | AppError::CorruptTokenError { .. }
            | AppError::CsvError(_)
            | AppError::SerializationError(_) => ErrorCategory::Data,
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::FixtureError { .. } => ErrorCategory::Configuration,
            AppError::IoError(_) => ErrorCategory::System,
        }
    }

    /// Upload failures keep the 500 the hosted service has always answered with;
    /// token failures are the caller's fault and answer 400.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoNamesProvided
            | AppError::MissingUploadFile
            | AppError::EmptyFilename
            | AppError::MalformedUpload { .. }
            | AppError::CorruptTokenError { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent back in the `error` field of a JSON response.
    pub fn client_message(&self) -> String {
        match self {
            AppError::FormatError { message } | AppError::CorruptTokenError { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => "Check the request parameters and try again",
            ErrorCategory::Data => "Upload a JSON array of flat objects, or use a token returned by /upload",
            ErrorCategory::Configuration => "Check command line flags, environment variables and the config file",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值 {} 無效: {}", field, reason)
            }
            AppError::FixtureError { message } => format!("無法載入學生資料: {}", message),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.client_message() });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_client_errors() {
        assert_eq!(AppError::NoNamesProvided.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingUploadFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyFilename.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::corrupt_token("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upload_transport_errors() {
        let too_large = AppError::PayloadTooLarge;
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.client_message(), "Upload exceeds the size limit");
        assert_eq!(too_large.category(), ErrorCategory::Request);

        let malformed = AppError::MalformedUpload {
            message: "missing boundary".to_string(),
        };
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_format_error_keeps_upload_status() {
        let err = AppError::format("expected a JSON array");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "expected a JSON array");
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_messages_match_legacy_bodies() {
        assert_eq!(AppError::NoNamesProvided.client_message(), "No names provided");
        assert_eq!(AppError::MissingUploadFile.client_message(), "No file part");
        assert_eq!(AppError::EmptyFilename.client_message(), "No file selected");
    }
}
