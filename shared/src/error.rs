//! Transport-facing error codes
//!
//! The orchestration core surfaces typed errors; the layer on top maps
//! them to these serializable codes instead of string-matching messages.

use serde::{Deserialize, Serialize};

/// Stable error code set for the API boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    Conflict,
    IllegalTransition,
    InvalidState,
    NotFound,
    PromotionInactive,
    PromotionNotStarted,
    PromotionExpired,
    PromotionUsageLimitReached,
    PromotionMinimumNotMet,
    CancellationWindowClosed,
    RepositoryFailure,
}

/// Error payload returned across the service boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
