//! Shared types for the Mesa restaurant operations core
//!
//! Common types used across crates: entity models, status enums,
//! and the transport-facing error code set.

pub mod error;
pub mod models;

// Re-exports
pub use error::ErrorCode;
pub use serde::{Deserialize, Serialize};
