//! Errors surfaced by the hub's public operations.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::ports::BroadcastError;

/// Error returned to the transport layer.
///
/// `InvalidArgument` is raised before any registry mutation. A
/// `DeliveryFailure` means the mutation stands but some notification did
/// not reach its targets. Storage failures never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Delivery failed: {0}")]
    DeliveryFailure(#[from] BroadcastError),
}

impl HubError {
    /// Code reported to the client in error frames.
    pub fn code(&self) -> ErrorCode {
        match self {
            HubError::InvalidArgument(ValidationError::TooLong { .. }) => ErrorCode::MessageTooLong,
            HubError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            HubError::DeliveryFailure(_) => ErrorCode::DeliveryFailed,
        }
    }
}
