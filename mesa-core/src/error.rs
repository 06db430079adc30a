//! Core error types
//!
//! Every operation returns either the full updated entity or one of
//! these typed errors; errors are never used for control flow inside
//! the core, and a rejected operation leaves all entities unchanged.

use shared::error::{ErrorBody, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

use crate::promotions::PromotionError;
use crate::repository::RepoError;

/// Orchestration core errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input; recoverable by the caller correcting it
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic-concurrency loss; caller may re-fetch and retry once
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Attempted order transition outside the legal sequence
    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Operation violates the current state machine state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Promotion-specific rejection, surfaced verbatim to the UI
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Customer cancellation attempted inside the cutoff window
    #[error("Cancellation window closed: {0}")]
    CancellationWindow(String),

    /// Infrastructure failure passed through untouched; retry policy
    /// belongs to the calling layer
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Stable code for the transport boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation(_) => ErrorCode::Validation,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            CoreError::InvalidState(_) => ErrorCode::InvalidState,
            CoreError::NotFound(_) => ErrorCode::NotFound,
            CoreError::Promotion(err) => err.code(),
            CoreError::CancellationWindow(_) => ErrorCode::CancellationWindowClosed,
            CoreError::Repo(_) => ErrorCode::RepositoryFailure,
        }
    }
}

impl From<CoreError> for ErrorBody {
    fn from(err: CoreError) -> Self {
        ErrorBody::new(err.code(), err.to_string())
    }
}
