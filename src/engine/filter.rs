use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::identity;
use crate::models::{Lesson, StudentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    #[serde(default)]
    pub bookings: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedLesson {
    #[serde(flatten)]
    pub lesson: CalendarLesson,
    pub is_filtered: bool,
}

fn is_cancelled(booking: &Value) -> bool {
    booking.get("status").and_then(Value::as_str) == Some("cancelled")
}

fn booked_students(lesson: &CalendarLesson) -> BTreeSet<StudentId> {
    lesson
        .bookings
        .iter()
        .flatten()
        .filter(|b| !is_cancelled(b))
        .filter_map(identity::booking_student_id)
        .collect()
}

/// Marks each lesson filtered out unless one of its bookings belongs to a selected
/// student. With no selection nothing is filtered. Local only; never fetches.
pub fn annotate<S: AsRef<str>>(
    lessons: &[CalendarLesson],
    selected_student_ids: &[S],
) -> Vec<AnnotatedLesson> {
    let selected = identity::normalize_strs(selected_student_ids);

    lessons
        .iter()
        .map(|lesson| {
            let is_filtered =
                !selected.is_empty() && booked_students(lesson).is_disjoint(&selected);
            AnnotatedLesson {
                lesson: lesson.clone(),
                is_filtered,
            }
        })
        .collect()
}
