//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    NeedsCleaning,
    Unavailable,
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub name: String,
    pub capacity: i32,
    pub status: TableStatus,
    /// Active order reference; Some iff status is Occupied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}
