use std::collections::BTreeSet;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, ValidationError};
use crate::models::Lesson;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    Time,
    Capacity,
    Teacher,
    Color,
    Subject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum Classification {
    NoChange,
    Single(ChangeField),
    Composite(BTreeSet<ChangeField>),
}

impl Classification {
    pub fn is_change(&self) -> bool {
        !matches!(self, Classification::NoChange)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDiff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

fn changed_to<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    if before == after { None } else { Some(after.clone()) }
}

impl LessonDiff {
    pub fn between(before: &Lesson, after: &Lesson) -> Self {
        Self {
            start_time: changed_to(&before.start_time.time(), &after.start_time.time()),
            end_time: changed_to(&before.end_time.time(), &after.end_time.time()),
            capacity: changed_to(&before.capacity, &after.capacity),
            teacher_id: changed_to(&before.teacher_id, &after.teacher_id),
            color: changed_to(&before.color, &after.color),
            subject: changed_to(&before.subject, &after.subject),
        }
    }

    pub fn fields(&self) -> BTreeSet<ChangeField> {
        let mut fields = BTreeSet::new();
        if self.start_time.is_some() || self.end_time.is_some() {
            fields.insert(ChangeField::Time);
        }
        if self.capacity.is_some() {
            fields.insert(ChangeField::Capacity);
        }
        if self.teacher_id.is_some() {
            fields.insert(ChangeField::Teacher);
        }
        if self.color.is_some() {
            fields.insert(ChangeField::Color);
        }
        if self.subject.is_some() {
            fields.insert(ChangeField::Subject);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn apply_to(&self, lesson: &Lesson) -> Lesson {
        let mut next = lesson.clone();
        if let Some(t) = self.start_time {
            next.start_time = NaiveDateTime::new(lesson.start_time.date(), t);
        }
        if let Some(t) = self.end_time {
            next.end_time = NaiveDateTime::new(lesson.end_time.date(), t);
        }
        if let Some(capacity) = self.capacity {
            next.capacity = capacity;
        }
        if let Some(teacher_id) = &self.teacher_id {
            next.teacher_id = teacher_id.clone();
        }
        if let Some(color) = &self.color {
            next.color = color.clone();
        }
        if let Some(subject) = &self.subject {
            next.subject = subject.clone();
        }
        next
    }
}

fn check_determinate(before: &Lesson, after: &Lesson) -> Result<(), EngineError> {
    if before.id != after.id {
        return Err(EngineError::Indeterminate(format!(
            "snapshot {} and edit {} are different lessons",
            before.id, after.id
        )));
    }
    if before.template_lesson_id != after.template_lesson_id {
        return Err(EngineError::Indeterminate(format!(
            "lesson {} changed template origin",
            after.id
        )));
    }
    if after.capacity < 1 {
        return Err(EngineError::Indeterminate(format!(
            "lesson {} has capacity {}",
            after.id, after.capacity
        )));
    }
    if after.end_time <= after.start_time {
        return Err(EngineError::Indeterminate(format!(
            "lesson {} ends at or before it starts",
            after.id
        )));
    }
    Ok(())
}

fn check_roster_fits(after: &Lesson) -> Result<(), ValidationError> {
    if after.enrolled_count() > after.capacity as usize {
        return Err(ValidationError::CapacityExceeded {
            capacity: after.capacity,
            requested: after.enrolled_count(),
        });
    }
    Ok(())
}

pub fn classify(before: &Lesson, after: &Lesson) -> Result<Classification, EngineError> {
    check_determinate(before, after)?;
    check_roster_fits(after)?;

    let mut fields = LessonDiff::between(before, after).fields();
    let classification = match fields.len() {
        0 => Classification::NoChange,
        1 => match fields.pop_first() {
            Some(field) => Classification::Single(field),
            None => Classification::NoChange,
        },
        _ => Classification::Composite(fields),
    };
    debug!("lesson {} classified as {:?}", after.id, classification);
    Ok(classification)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSibling {
    pub lesson_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingUpdate {
    pub lesson: Lesson,
    /// Differs from the plan's diff when part of the edit was held back for this sibling.
    pub diff: LessonDiff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationPlan {
    pub classification: Classification,
    pub diff: LessonDiff,
    pub updates: Vec<SiblingUpdate>,
    pub skipped: Vec<SkippedSibling>,
}

impl PropagationPlan {
    pub fn affected_count(&self) -> usize {
        self.updates.len()
    }
}

/// The original start anchors the series even when the edit moves the date. A capacity
/// cut below a sibling's roster is held back for that sibling; the rest still applies.
pub fn plan_subsequent(
    original: &Lesson,
    edited: &Lesson,
    candidates: &[Lesson],
) -> Result<PropagationPlan, EngineError> {
    let classification = classify(original, edited)?;
    let diff = LessonDiff::between(original, edited);

    let mut plan = PropagationPlan {
        classification,
        diff,
        updates: Vec::new(),
        skipped: Vec::new(),
    };
    if !plan.classification.is_change() {
        return Ok(plan);
    }
    let Some(template_id) = edited.template_lesson_id.as_deref() else {
        debug!("lesson {} has no template origin, nothing to propagate", edited.id);
        return Ok(plan);
    };

    let mut siblings: Vec<&Lesson> = candidates
        .iter()
        .filter(|l| l.id != edited.id)
        .filter(|l| l.template_lesson_id.as_deref() == Some(template_id))
        .filter(|l| l.start_time > original.start_time)
        .collect();
    siblings.sort_by_key(|l| l.start_time);

    for sibling in siblings {
        let mut diff = plan.diff.clone();
        let held_back = diff
            .capacity
            .filter(|capacity| sibling.enrolled_count() > *capacity as usize);
        if let Some(capacity) = held_back {
            warn!(
                "not reducing capacity of {} to {}: {} students enrolled",
                sibling.id,
                capacity,
                sibling.enrolled_count()
            );
            plan.skipped.push(SkippedSibling {
                lesson_id: sibling.id.clone(),
                reason: format!(
                    "{} students enrolled exceed new capacity {}",
                    sibling.enrolled_count(),
                    capacity
                ),
            });
            diff.capacity = None;
        }
        if diff.is_empty() {
            continue;
        }

        let updated = diff.apply_to(sibling);
        if updated.end_time <= updated.start_time {
            plan.skipped.push(SkippedSibling {
                lesson_id: sibling.id.clone(),
                reason: "new times would end before start".to_string(),
            });
            continue;
        }
        plan.updates.push(SiblingUpdate {
            lesson: updated,
            diff,
        });
    }

    Ok(plan)
}
