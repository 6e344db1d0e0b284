use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::engine::gate::{self, ActorRole, GateDecision, Intent};
use crate::engine::{CreditLedger, LedgerStatus};
use crate::error::EngineError;
use crate::models::{BookingAction, CreditBalance, Lesson, StudentId, active_student_ids};
use crate::store::{LessonChange, LessonStore};

pub struct EnrollmentService {
    store: Arc<dyn LessonStore>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentOutcome {
    pub decision: GateDecision,
    pub lesson: Lesson,
    pub balance_after: CreditBalance,
    pub ledger_status: LedgerStatus,
    /// Set when bookings or credits could not be fetched and fallbacks were used.
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct ReleaseStats {
    pub lesson_id: String,
    pub bookings_cancelled: usize,
    pub credits_refunded: CreditBalance,
    pub failed: Vec<StudentId>,
    pub deleted: bool,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn LessonStore>) -> Self {
        Self { store }
    }

    pub async fn load_ledger(&self) -> CreditLedger {
        match self.store.fetch_credits().await {
            Ok(response) => CreditLedger::build(&response),
            Err(e) => {
                warn!("credits fetch failed, denying non-admin adds: {}", e);
                CreditLedger::unavailable(e.to_string())
            }
        }
    }

    async fn current_lesson(&self, lesson: &Lesson) -> (Lesson, bool) {
        match self.store.fetch_bookings(&lesson.id).await {
            Ok(bookings) => {
                let roster = active_student_ids(&bookings);
                if roster != lesson.enrolled_student_ids {
                    warn!(
                        "roster of lesson {} disagrees with its bookings, using bookings",
                        lesson.id
                    );
                }
                (lesson.clone().with_roster(roster), false)
            }
            Err(e) => {
                warn!("bookings fetch failed for lesson {}: {}", lesson.id, e);
                (lesson.clone(), true)
            }
        }
    }

    async fn execute(&self, intents: &[Intent]) -> Result<(), EngineError> {
        for intent in intents {
            match intent {
                Intent::CreateBooking {
                    lesson_id,
                    student_id,
                } => {
                    self.store
                        .persist_booking(lesson_id, student_id, BookingAction::Create)
                        .await?
                }
                Intent::CancelBooking {
                    lesson_id,
                    student_id,
                } => {
                    self.store
                        .persist_booking(lesson_id, student_id, BookingAction::Cancel)
                        .await?
                }
                Intent::Debit { .. } | Intent::Refund { .. } => {}
            }
        }
        Ok(())
    }

    async fn carry_out(
        &self,
        lesson: Lesson,
        student_id: &str,
        decision: GateDecision,
        ledger: CreditLedger,
        degraded: bool,
    ) -> Result<EnrollmentOutcome, EngineError> {
        self.execute(decision.intents()).await?;

        let lesson = gate::apply_to_lesson(&lesson, decision.intents());
        let ledger = ledger.with_intents(decision.intents());
        Ok(EnrollmentOutcome {
            balance_after: ledger.balance_of(student_id),
            ledger_status: ledger.status().clone(),
            degraded: degraded || !ledger.is_known(),
            lesson,
            decision,
        })
    }

    pub async fn add_student(
        &self,
        lesson: &Lesson,
        student_id: &str,
        actor: ActorRole,
    ) -> Result<EnrollmentOutcome, EngineError> {
        let (lesson, degraded) = self.current_lesson(lesson).await;
        let ledger = self.load_ledger().await;

        let decision = gate::request_add(&lesson, student_id, actor, &ledger)?;
        if let Some(reason) = decision.denial() {
            info!("add of {} to lesson {} denied: {:?}", student_id, lesson.id, reason);
        }
        self.carry_out(lesson, student_id, decision, ledger, degraded)
            .await
    }

    pub async fn remove_student(
        &self,
        lesson: &Lesson,
        student_id: &str,
    ) -> Result<EnrollmentOutcome, EngineError> {
        let (lesson, degraded) = self.current_lesson(lesson).await;
        let ledger = self.load_ledger().await;

        let decision = gate::request_remove(&lesson, student_id)?;
        self.carry_out(lesson, student_id, decision, ledger, degraded)
            .await
    }

    /// The lesson is kept if any cancellation failed.
    pub async fn delete_lesson(&self, lesson: &Lesson) -> Result<ReleaseStats, EngineError> {
        let (lesson, degraded) = self.current_lesson(lesson).await;
        if degraded {
            warn!("releasing lesson {} from its cached roster", lesson.id);
        }

        let mut stats = ReleaseStats {
            lesson_id: lesson.id.clone(),
            bookings_cancelled: 0,
            credits_refunded: 0,
            failed: Vec::new(),
            deleted: false,
        };

        for student_id in &lesson.enrolled_student_ids {
            let intents = gate::removal_intents(&lesson.id, student_id.clone());
            match self.execute(&intents).await {
                Ok(()) => {
                    stats.bookings_cancelled += 1;
                    stats.credits_refunded += gate::REQUIRED_CREDITS;
                }
                Err(e) => {
                    warn!("failed to cancel booking of {} on {}: {}", student_id, lesson.id, e);
                    stats.failed.push(student_id.clone());
                }
            }
        }

        if !stats.failed.is_empty() {
            warn!(
                "keeping lesson {}: {} bookings could not be released",
                lesson.id,
                stats.failed.len()
            );
            return Ok(stats);
        }

        self.store
            .persist_lesson_change(&lesson.id, &LessonChange::Delete)
            .await?;
        stats.deleted = true;
        info!(
            "deleted lesson {} ({} bookings released)",
            lesson.id, stats.bookings_cancelled
        );
        Ok(stats)
    }
}
