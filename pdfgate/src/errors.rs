use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (missing file part, password rules)
    #[error("{message}")]
    BadRequest { message: String },

    /// Uploaded document exceeded the configured size ceiling
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// The unlock tool rejected the supplied credential
    #[error("Incorrect password or cannot unlock this PDF.")]
    IncorrectPassword,

    /// The external tool could not complete a transform
    #[error("{operation} failed: {detail}")]
    ToolFailure { operation: &'static str, detail: String },

    /// Malformed or interrupted multipart stream
    #[error(transparent)]
    Upload(#[from] axum::extract::multipart::MultipartError),

    /// Filesystem error while staging the document
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::IncorrectPassword => StatusCode::FORBIDDEN,
            Error::ToolFailure { .. } | Error::Upload(_) | Error::Io(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the plain-text body for the response. Failure categories carry
    /// their diagnostic detail; anything unexpected stays generic.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::IncorrectPassword => "Incorrect password or cannot unlock this PDF.".to_string(),
            Error::ToolFailure { operation, detail } => format!("{operation} failed: {detail}"),
            Error::Upload(e) => format!("Upload failed: {e}"),
            Error::Io(e) => format!("File handling failed: {e}"),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details - different log levels based on severity
        match &self {
            Error::ToolFailure { .. } | Error::Upload(_) | Error::Io(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::IncorrectPassword => {
                tracing::info!("Unlock rejected: {}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
