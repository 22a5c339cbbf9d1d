use thiserror::Error;

use crate::domain::model::OperationKind;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Server rejected the request: {message}")]
    ServerError { message: String },

    #[error("{operation} request failed: {message}")]
    TransportError {
        operation: OperationKind,
        message: String,
    },

    #[error("{operation} already in flight for item {item_id}")]
    AlreadyInFlight {
        item_id: String,
        operation: OperationKind,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl CartError {
    /// Text shown to the user through the notifier.
    pub fn user_friendly_message(&self) -> String {
        match self {
            CartError::ServerError { message } => message.clone(),
            CartError::TransportError { operation, .. } => {
                operation.generic_error_message().to_string()
            }
            CartError::AlreadyInFlight { .. } => {
                "La operación ya está en curso, espera un momento".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CartError::TransportError { .. } | CartError::HttpError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
