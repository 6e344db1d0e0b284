use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLesson {
    pub id: String,
    pub day_of_week: u8, // 0 = Sunday, 1 = Monday, ..., 6 = Saturday
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub teacher_id: String,
    pub capacity: u32,
    pub subject: String,
    pub color: String,
    /// Pre-assigned roster in any identity shape (scalars, `{id}`, `{student_id}`).
    #[serde(default)]
    pub assigned_student_ids: serde_json::Value,
}

impl TemplateLesson {
    pub fn days_from_monday(&self) -> Result<i64, ValidationError> {
        if self.day_of_week > 6 {
            return Err(ValidationError::InvalidDayOfWeek(self.day_of_week));
        }
        Ok((i64::from(self.day_of_week) + 6) % 7)
    }

    pub fn day_name(&self) -> &'static str {
        match self.day_of_week {
            0 => "Sunday",
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            _ => "Invalid",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.days_from_monday()?;
        if self.capacity < 1 {
            return Err(ValidationError::InvalidCapacity(self.capacity));
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_time.to_string(),
                end: self.end_time.to_string(),
            });
        }
        Ok(())
    }
}
