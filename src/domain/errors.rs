use thiserror::Error;

use super::lifecycle::OrderAction;
use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Action '{action}' is not permitted for an order in status {status}")]
    NotPermitted {
        action: OrderAction,
        status: OrderStatus,
    },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
