use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream failure in {operation}: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    #[error("Cannot classify lesson change: {0}")]
    Indeterminate(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn upstream(operation: &'static str, message: impl Into<String>) -> Self {
        EngineError::Upstream {
            operation,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::Upstream { .. } => "upstream_failure",
            EngineError::Indeterminate(_) => "indeterminate_change",
            EngineError::Config(_) => "config_error",
            EngineError::Serialization(_) => "serialization_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("week starting {week_start} is before the current week ({current_week_start})")]
    PastWeek {
        week_start: NaiveDate,
        current_week_start: NaiveDate,
    },

    #[error("{requested} students exceed lesson capacity {capacity}")]
    CapacityExceeded { capacity: u32, requested: usize },

    #[error("capacity must be at least 1, got {0}")]
    InvalidCapacity(u32),

    #[error("day of week must be 0-6, got {0}")]
    InvalidDayOfWeek(u8),

    #[error("end time {end} is not after start time {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("student id is empty")]
    EmptyStudentId,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(err: &EngineError) -> Self {
        let message = match err {
            EngineError::Validation(rule) => rule.to_string(),
            EngineError::Upstream { operation, message } => {
                error!("upstream failure in {}: {}", operation, message);
                format!("{} failed, showing last known data", operation)
            }
            EngineError::Indeterminate(reason) => reason.clone(),
            EngineError::Config(msg) => msg.clone(),
            EngineError::Serialization(e) => {
                error!("serialization error: {}", e);
                "Malformed payload".to_string()
            }
        };

        ErrorResponse {
            error: err.code().to_string(),
            message,
        }
    }
}
