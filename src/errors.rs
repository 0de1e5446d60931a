use thiserror::Error;

use crate::domain::advisory::Advisory;
use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::InvalidInput(msg) => AppError::Validation(msg),
            e @ DomainError::NotPermitted { .. } => AppError::NotPermitted(e.to_string()),
            DomainError::Unauthorized => AppError::Backend {
                status: 401,
                message: "Unauthorized".to_string(),
            },
            DomainError::Rejected { status, message } => AppError::Backend { status, message },
            DomainError::Unavailable(msg) => AppError::Unavailable(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl AppError {
    /// Whether the call never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotPermitted(_)
                | AppError::NotAuthenticated
                | AppError::Config(_)
        )
    }

    /// User-facing message for `context` (e.g. "Could not load products").
    pub fn advisory(&self, context: &str) -> Advisory {
        match self {
            AppError::Validation(msg) => Advisory::error(capitalize(msg)),
            AppError::NotPermitted(msg) => Advisory::error(msg.clone()),
            AppError::SessionExpired => Advisory::error("Session expired. Please log in again"),
            AppError::NotAuthenticated => Advisory::error("Please log in first"),
            AppError::NotFound => Advisory::error(format!("{}: not found", context)),
            AppError::Backend { message, .. } if !message.is_empty() => {
                Advisory::error(format!("{}: {}", context, message))
            }
            _ => Advisory::error(context.to_string()),
        }
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
