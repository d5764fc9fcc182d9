//! Error type shared by the storage and domain layers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Invalid day or slot index: day {day_index}, slot {slot_index}")]
    InvalidIndex { day_index: usize, slot_index: usize },

    #[error("Week {week} does not exist in ISO year {year}")]
    InvalidWeek { year: i32, week: u32 },

    #[error("Invalid prize target: {0}")]
    InvalidTarget(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("Child {child_id} does not belong to parent {parent_id}")]
    Forbidden { child_id: String, parent_id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChartError {
    /// True for errors raised before any state was touched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChartError::InvalidIndex { .. }
                | ChartError::InvalidWeek { .. }
                | ChartError::InvalidTarget(_)
                | ChartError::InvalidSettings(_)
        )
    }
}
