use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::identity;
use crate::engine::ledger::CreditLedger;
use crate::error::ValidationError;
use crate::models::{CreditBalance, Lesson, StudentId};

pub const REQUIRED_CREDITS: CreditBalance = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Teacher,
    Student,
}

impl ActorRole {
    pub fn is_admin(self) -> bool {
        matches!(self, ActorRole::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    NotEnrolled,
    Enrolled,
}

impl EnrollmentState {
    pub fn of(lesson: &Lesson, student_id: &str) -> Self {
        if lesson.is_enrolled(student_id) {
            EnrollmentState::Enrolled
        } else {
            EnrollmentState::NotEnrolled
        }
    }
}

/// Side effect the caller must carry out. The engine never performs them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Debit {
        student_id: StudentId,
        amount: CreditBalance,
    },
    Refund {
        student_id: StudentId,
        amount: CreditBalance,
    },
    CreateBooking {
        lesson_id: String,
        student_id: StudentId,
    },
    CancelBooking {
        lesson_id: String,
        student_id: StudentId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    InsufficientCredits {
        current_balance: CreditBalance,
        required: CreditBalance,
    },
    CapacityReached {
        capacity: u32,
        enrolled: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Permitted {
        from: EnrollmentState,
        to: EnrollmentState,
        intents: Vec<Intent>,
    },
    Unchanged { state: EnrollmentState },
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, GateDecision::Permitted { .. })
    }

    pub fn intents(&self) -> &[Intent] {
        match self {
            GateDecision::Permitted { intents, .. } => intents,
            _ => &[],
        }
    }

    pub fn denial(&self) -> Option<&DenialReason> {
        match self {
            GateDecision::Denied(reason) => Some(reason),
            _ => None,
        }
    }
}

fn checked_id(student_id: &str) -> Result<StudentId, ValidationError> {
    let id = student_id.trim();
    if id.is_empty() {
        return Err(ValidationError::EmptyStudentId);
    }
    Ok(id.to_string())
}

pub fn request_add(
    lesson: &Lesson,
    student_id: &str,
    actor: ActorRole,
    ledger: &CreditLedger,
) -> Result<GateDecision, ValidationError> {
    let student_id = checked_id(student_id)?;

    if lesson.is_enrolled(&student_id) {
        return Ok(GateDecision::Unchanged {
            state: EnrollmentState::Enrolled,
        });
    }

    if lesson.is_full() {
        return Ok(GateDecision::Denied(DenialReason::CapacityReached {
            capacity: lesson.capacity,
            enrolled: lesson.enrolled_count(),
        }));
    }

    let balance = ledger.balance_of(&student_id);
    if !actor.is_admin() && balance < REQUIRED_CREDITS {
        debug!(
            "denying {} for lesson {}: balance {} < {}",
            student_id, lesson.id, balance, REQUIRED_CREDITS
        );
        return Ok(GateDecision::Denied(DenialReason::InsufficientCredits {
            current_balance: balance,
            required: REQUIRED_CREDITS,
        }));
    }

    Ok(GateDecision::Permitted {
        from: EnrollmentState::NotEnrolled,
        to: EnrollmentState::Enrolled,
        intents: vec![
            Intent::Debit {
                student_id: student_id.clone(),
                amount: REQUIRED_CREDITS,
            },
            Intent::CreateBooking {
                lesson_id: lesson.id.clone(),
                student_id,
            },
        ],
    })
}

pub fn request_remove(lesson: &Lesson, student_id: &str) -> Result<GateDecision, ValidationError> {
    let student_id = checked_id(student_id)?;

    if !lesson.is_enrolled(&student_id) {
        return Ok(GateDecision::Unchanged {
            state: EnrollmentState::NotEnrolled,
        });
    }

    Ok(GateDecision::Permitted {
        from: EnrollmentState::Enrolled,
        to: EnrollmentState::NotEnrolled,
        intents: removal_intents(&lesson.id, student_id),
    })
}

pub fn removal_intents(lesson_id: &str, student_id: StudentId) -> Vec<Intent> {
    vec![
        Intent::Refund {
            student_id: student_id.clone(),
            amount: REQUIRED_CREDITS,
        },
        Intent::CancelBooking {
            lesson_id: lesson_id.to_string(),
            student_id,
        },
    ]
}

pub fn release_lesson(lesson: &Lesson) -> Vec<Intent> {
    lesson
        .enrolled_student_ids
        .iter()
        .flat_map(|id| removal_intents(&lesson.id, id.clone()))
        .collect()
}

pub fn apply_to_lesson(lesson: &Lesson, intents: &[Intent]) -> Lesson {
    let mut next = lesson.clone();
    for intent in intents {
        match intent {
            Intent::CreateBooking {
                lesson_id,
                student_id,
            } if *lesson_id == lesson.id => {
                next.enrolled_student_ids.insert(student_id.clone());
            }
            Intent::CancelBooking {
                lesson_id,
                student_id,
            } if *lesson_id == lesson.id => {
                next.enrolled_student_ids.remove(student_id);
            }
            _ => {}
        }
    }
    next
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterDenial {
    pub student_id: StudentId,
    pub reason: DenialReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterPlan {
    pub intents: Vec<Intent>,
    pub added: Vec<StudentId>,
    pub removed: Vec<StudentId>,
    pub denials: Vec<RosterDenial>,
}

impl RosterPlan {
    pub fn is_noop(&self) -> bool {
        self.intents.is_empty() && self.denials.is_empty()
    }
}

/// Transitions needed to turn the lesson's roster into `desired`, which may use any
/// identity shape. Removals run first so they free seats; each add is gated against
/// the balance left after the adds before it.
pub fn plan_roster_change(
    lesson: &Lesson,
    desired: &Value,
    actor: ActorRole,
    ledger: &CreditLedger,
) -> RosterPlan {
    let current: Vec<Value> = lesson
        .enrolled_student_ids
        .iter()
        .map(|id| Value::String(id.clone()))
        .collect();
    if !identity::changed(&Value::Array(current), desired) {
        return RosterPlan::default();
    }

    let desired = identity::normalize(desired);
    let mut plan = RosterPlan::default();
    let mut working = lesson.clone();
    let mut balances = ledger.clone();

    let leaving: Vec<StudentId> = lesson
        .enrolled_student_ids
        .difference(&desired)
        .cloned()
        .collect();
    for student_id in leaving {
        let intents = removal_intents(&lesson.id, student_id.clone());
        working = apply_to_lesson(&working, &intents);
        balances = balances.with_intents(&intents);
        plan.intents.extend(intents);
        plan.removed.push(student_id);
    }

    for student_id in desired.difference(&lesson.enrolled_student_ids) {
        match request_add(&working, student_id, actor, &balances) {
            Ok(GateDecision::Permitted { intents, .. }) => {
                working = apply_to_lesson(&working, &intents);
                balances = balances.with_intents(&intents);
                plan.intents.extend(intents);
                plan.added.push(student_id.clone());
            }
            Ok(GateDecision::Denied(reason)) => plan.denials.push(RosterDenial {
                student_id: student_id.clone(),
                reason,
            }),
            Ok(GateDecision::Unchanged { .. }) | Err(_) => {}
        }
    }

    plan
}
