//! Core configuration
//!
//! All knobs of the orchestration core live here so the transport layer
//! can construct the services without scattering constants.
//!
//! # Environment variables
//!
//! Every field can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | TAX_RATE | 0.10 | Tax rate applied to the discounted subtotal |
//! | CANCELLATION_WINDOW_HOURS | 2 | Customer cancellation cutoff before the booking time |
//! | RESERVATION_LOOKAHEAD_HOURS | 2 | Window for upcoming-reservation warnings |
//! | RESERVATION_CONFLICT_MINUTES | 45 | Proximity window that makes two bookings collide |

use rust_decimal::Decimal;
use std::str::FromStr;

/// Orchestration core configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Tax rate applied to `sub_total - discount`, e.g. 0.10
    pub tax_rate: Decimal,
    /// Customers may cancel a booking only while at least this many
    /// hours remain before the scheduled time
    pub cancellation_window_hours: i64,
    /// How far ahead to look when warning staff about reservations on a
    /// table they are about to seat
    pub reservation_lookahead_hours: i64,
    /// Two bookings on one table within this many minutes of each other
    /// are considered conflicting
    pub reservation_conflict_minutes: i64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            // Decimal::new(10, 2) == 0.10
            tax_rate: Decimal::new(10, 2),
            cancellation_window_hours: 2,
            reservation_lookahead_hours: 2,
            reservation_conflict_minutes: 45,
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tax_rate: std::env::var("TAX_RATE")
                .ok()
                .and_then(|v| Decimal::from_str(&v).ok())
                .unwrap_or(defaults.tax_rate),
            cancellation_window_hours: std::env::var("CANCELLATION_WINDOW_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cancellation_window_hours),
            reservation_lookahead_hours: std::env::var("RESERVATION_LOOKAHEAD_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reservation_lookahead_hours),
            reservation_conflict_minutes: std::env::var("RESERVATION_CONFLICT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reservation_conflict_minutes),
        }
    }
}
