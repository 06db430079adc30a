//! Mesa Core: Order & Table Orchestration
//!
//! The business layer of a restaurant operations platform:
//!
//! - **orders**: order lifecycle state machine (creation → kitchen →
//!   serving → payment → completion/cancellation)
//! - **tables**: table occupancy state machine and reservation queries
//! - **promotions**: promotion validation, discount computation, and
//!   atomic redemption
//! - **bookings**: reservation flow with the customer cancellation window
//! - **facade**: the POS/booking-facing composition of the above
//!
//! The core is request/response driven and owns no transport or storage:
//! persistence goes through the [`repository`] traits, the menu catalog
//! through [`catalog::MenuCatalog`], and time through [`clock::Clock`].
//! Every mutating operation returns the full updated entity, so callers
//! never need a follow-up read.

pub mod bookings;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod facade;
pub mod money;
pub mod orders;
pub mod promotions;
pub mod repository;
pub mod tables;
pub mod utils;

// Re-exports
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use facade::{OpsFacade, Seating};
