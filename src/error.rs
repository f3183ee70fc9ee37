use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Invalid offering data: {0}")]
    InvalidOfferingData(String),
    #[error("Invalid booking data: {0}")]
    InvalidBookingData(String),
    #[error("Route {id} is sold out")]
    OutOfStock { id: String },
    #[error("Only {available} seats available for route {id}")]
    MaxQuantityReached { id: String, available: u32 },
    #[error("Staging line {line_id} failed: {message}")]
    StageFailed { line_id: String, message: String },
    #[error("Checkout confirmation failed: {message}")]
    ConfirmFailed { message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Commit timed out")]
    Timeout,
    #[error("Invalid checkout transition: {0}")]
    InvalidTransition(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CartError {
    /// The message the remote service attached to a rejection, if any.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            CartError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// True for failures below the HTTP layer (connection refused, reset, etc).
    pub fn is_transport(&self) -> bool {
        matches!(self, CartError::NetworkError(_))
    }
}

pub type Result<T, E = CartError> = std::result::Result<T, E>;
