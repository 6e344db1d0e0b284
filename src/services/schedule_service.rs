use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::materialize::{self, MaterializationPreview};
use crate::engine::propagation::{self, Classification, SkippedSibling};
use crate::error::EngineError;
use crate::models::{BookingAction, Lesson, StudentId, TemplateLesson};
use crate::store::{LessonChange, LessonStore};

pub struct ScheduleService {
    store: Arc<dyn LessonStore>,
    config: EngineConfig,
}

#[derive(Debug, Serialize)]
pub struct MaterializeStats {
    pub week_start: NaiveDate,
    pub lessons_created: usize,
    pub lessons_skipped: usize,
    pub bookings_created: usize,
    pub failed_lessons: Vec<String>,
    pub failed_bookings: Vec<FailedBooking>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBooking {
    pub lesson_id: String,
    pub student_id: StudentId,
}

#[derive(Debug, Serialize)]
pub struct PropagationStats {
    pub classification: Classification,
    pub affected_count: usize,
    pub updated: usize,
    pub failed: Vec<String>,
    pub skipped: Vec<SkippedSibling>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn LessonStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn preview_week(
        &self,
        template: &[TemplateLesson],
        week_of: NaiveDate,
    ) -> Result<MaterializationPreview, EngineError> {
        Ok(materialize::preview(template, week_of, self.config.today())?)
    }

    // Lessons are created empty; a student joins only through a booking the store accepted.
    pub async fn apply_template(
        &self,
        template: &[TemplateLesson],
        week_of: NaiveDate,
        existing: &[Lesson],
    ) -> Result<MaterializeStats, EngineError> {
        let plan = materialize::plan(template, week_of, self.config.today())?;
        let planned = plan.lessons.len();
        let lessons = materialize::exclude_already_materialized(plan.lessons, existing);

        let mut stats = MaterializeStats {
            week_start: plan.week_start,
            lessons_created: 0,
            lessons_skipped: planned - lessons.len(),
            bookings_created: 0,
            failed_lessons: Vec::new(),
            failed_bookings: Vec::new(),
        };

        info!(
            "materializing {} lessons for week of {} ({} already present)",
            lessons.len(),
            plan.week_start,
            stats.lessons_skipped
        );

        for lesson in lessons {
            let assigned = lesson.enrolled_student_ids.clone();
            let lesson = lesson.with_roster(BTreeSet::new());
            let change = LessonChange::Create(lesson.clone());
            if let Err(e) = self.store.persist_lesson_change(&lesson.id, &change).await {
                warn!("failed to create lesson {}: {}", lesson.id, e);
                stats.failed_lessons.push(lesson.id.clone());
                continue;
            }
            stats.lessons_created += 1;

            for student_id in assigned {
                match self
                    .store
                    .persist_booking(&lesson.id, &student_id, BookingAction::Create)
                    .await
                {
                    Ok(()) => stats.bookings_created += 1,
                    Err(e) => {
                        warn!("failed to book {} on {}: {}", student_id, lesson.id, e);
                        stats.failed_bookings.push(FailedBooking {
                            lesson_id: lesson.id.clone(),
                            student_id,
                        });
                    }
                }
            }
        }

        info!("Materialization completed: {:?}", stats);
        Ok(stats)
    }

    pub async fn propagate_edit(
        &self,
        original: &Lesson,
        edited: &Lesson,
        siblings: &[Lesson],
    ) -> Result<PropagationStats, EngineError> {
        let plan = propagation::plan_subsequent(original, edited, siblings)?;

        let mut stats = PropagationStats {
            classification: plan.classification.clone(),
            affected_count: plan.affected_count(),
            updated: 0,
            failed: Vec::new(),
            skipped: plan.skipped.clone(),
        };
        if !plan.classification.is_change() {
            return Ok(stats);
        }

        let change = LessonChange::Update(plan.diff.clone());
        self.store.persist_lesson_change(&edited.id, &change).await?;

        for update in &plan.updates {
            let change = LessonChange::Update(update.diff.clone());
            match self
                .store
                .persist_lesson_change(&update.lesson.id, &change)
                .await
            {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    warn!("failed to propagate to lesson {}: {}", update.lesson.id, e);
                    stats.failed.push(update.lesson.id.clone());
                }
            }
        }

        info!(
            "propagated {:?} from lesson {} to {}/{} future lessons",
            stats.classification, edited.id, stats.updated, stats.affected_count
        );
        Ok(stats)
    }
}
