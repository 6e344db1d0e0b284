use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::StudentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lesson_id: String,
    pub student_id: StudentId,
    pub status: BookingStatus,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Create,
    Cancel,
}

pub fn active_student_ids(bookings: &[Booking]) -> BTreeSet<StudentId> {
    bookings
        .iter()
        .filter(|b| b.is_active())
        .map(|b| b.student_id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}
