use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Booking, StudentId, active_student_ids};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub teacher_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub capacity: u32,
    pub subject: String,
    pub color: String,
    #[serde(default)]
    pub enrolled_student_ids: BTreeSet<StudentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_lesson_id: Option<String>,
}

impl Lesson {
    pub fn is_enrolled(&self, student_id: &str) -> bool {
        self.enrolled_student_ids.contains(student_id.trim())
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled_student_ids.len()
    }

    pub fn is_full(&self) -> bool {
        self.enrolled_count() >= self.capacity as usize
    }

    pub fn matches_bookings(&self, bookings: &[Booking]) -> bool {
        let own: Vec<Booking> = bookings
            .iter()
            .filter(|b| b.lesson_id == self.id)
            .cloned()
            .collect();
        active_student_ids(&own) == self.enrolled_student_ids
    }

    pub fn with_roster(mut self, roster: BTreeSet<StudentId>) -> Self {
        self.enrolled_student_ids = roster;
        self
    }
}
