use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::gate::Intent;
use crate::engine::identity;
use crate::error::ValidationError;
use crate::models::{Lesson, StudentId, TemplateLesson};

/// Monday of the ISO week containing `date`. Sunday belongs to the week that began six days earlier.
pub fn week_start_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn week_start_midnight(date: NaiveDate) -> NaiveDateTime {
    week_start_monday(date).and_time(NaiveTime::MIN)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationPlan {
    pub week_start: NaiveDate,
    pub lessons: Vec<Lesson>,
    /// One `CreateBooking` per pre-assigned student. No debits: template rosters are not credit-gated.
    pub booking_intents: Vec<Intent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationPreview {
    pub week_start: NaiveDate,
    pub lesson_count: usize,
    pub credit_impact: BTreeMap<StudentId, u32>,
    pub roster: BTreeSet<StudentId>,
}

fn guard_week(week_start: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let target = week_start_monday(week_start);
    let current = week_start_monday(today);
    if target < current {
        return Err(ValidationError::PastWeek {
            week_start: target,
            current_week_start: current,
        });
    }
    Ok(target)
}

/// Fails as a whole, before producing any lesson, if the week is past or any slot is invalid.
pub fn plan(
    template: &[TemplateLesson],
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<MaterializationPlan, ValidationError> {
    let monday = guard_week(week_start, today)?;

    let mut slots = Vec::with_capacity(template.len());
    for slot in template {
        slot.validate()?;
        let roster = identity::normalize(&slot.assigned_student_ids);
        if roster.len() > slot.capacity as usize {
            return Err(ValidationError::CapacityExceeded {
                capacity: slot.capacity,
                requested: roster.len(),
            });
        }
        slots.push((slot, roster));
    }

    let mut lessons: Vec<Lesson> = Vec::with_capacity(slots.len());
    for (slot, roster) in slots {
        let day = monday + Duration::days(slot.days_from_monday()?);
        lessons.push(Lesson {
            id: Uuid::new_v4().to_string(),
            teacher_id: slot.teacher_id.clone(),
            start_time: day.and_time(slot.start_time),
            end_time: day.and_time(slot.end_time),
            capacity: slot.capacity,
            subject: slot.subject.clone(),
            color: slot.color.clone(),
            enrolled_student_ids: roster,
            template_lesson_id: Some(slot.id.clone()),
        });
    }
    lessons.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.template_lesson_id.cmp(&b.template_lesson_id))
    });

    let booking_intents = lessons
        .iter()
        .flat_map(|lesson| {
            lesson.enrolled_student_ids.iter().map(|student_id| Intent::CreateBooking {
                lesson_id: lesson.id.clone(),
                student_id: student_id.clone(),
            })
        })
        .collect();

    Ok(MaterializationPlan {
        week_start: monday,
        lessons,
        booking_intents,
    })
}

pub fn materialize(
    template: &[TemplateLesson],
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<Lesson>, ValidationError> {
    plan(template, week_start, today).map(|p| p.lessons)
}

pub fn preview(
    template: &[TemplateLesson],
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<MaterializationPreview, ValidationError> {
    let plan = plan(template, week_start, today)?;

    let mut credit_impact: BTreeMap<StudentId, u32> = BTreeMap::new();
    for lesson in &plan.lessons {
        for student_id in &lesson.enrolled_student_ids {
            *credit_impact.entry(student_id.clone()).or_insert(0) += 1;
        }
    }
    let roster = credit_impact.keys().cloned().collect();

    Ok(MaterializationPreview {
        week_start: plan.week_start,
        lesson_count: plan.lessons.len(),
        credit_impact,
        roster,
    })
}

pub fn exclude_already_materialized(lessons: Vec<Lesson>, existing: &[Lesson]) -> Vec<Lesson> {
    let taken: HashSet<(&str, NaiveDateTime)> = existing
        .iter()
        .filter_map(|l| l.template_lesson_id.as_deref().map(|t| (t, l.start_time)))
        .collect();

    lessons
        .into_iter()
        .filter(|l| match l.template_lesson_id.as_deref() {
            Some(t) => !taken.contains(&(t, l.start_time)),
            None => true,
        })
        .collect()
}
