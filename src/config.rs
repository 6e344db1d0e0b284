use std::env;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::error::EngineError;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub utc_offset: FixedOffset,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            log_filter: "lesson_engine=debug".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new_from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("ENGINE_UTC_OFFSET_MINUTES") {
            let minutes: i32 = raw.trim().parse().map_err(|_| {
                EngineError::Config(format!("ENGINE_UTC_OFFSET_MINUTES is not an integer: {}", raw))
            })?;
            config.utc_offset = Self::offset_from_minutes(minutes)?;
        }

        if let Ok(filter) = env::var("ENGINE_LOG_FILTER") {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }

        Ok(config)
    }

    pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, EngineError> {
        if minutes.abs() >= MAX_OFFSET_MINUTES {
            return Err(EngineError::Config(format!(
                "UTC offset {} minutes is out of range",
                minutes
            )));
        }
        FixedOffset::east_opt(minutes * 60)
            .ok_or_else(|| EngineError::Config(format!("invalid UTC offset {} minutes", minutes)))
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }
}
