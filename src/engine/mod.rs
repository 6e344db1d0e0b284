pub mod filter;
pub mod gate;
pub mod identity;
pub mod ledger;
pub mod materialize;
pub mod propagation;

pub use filter::{AnnotatedLesson, CalendarLesson, annotate};
pub use gate::{ActorRole, DenialReason, GateDecision, Intent, RosterPlan};
pub use ledger::{CreditLedger, LedgerStatus};
pub use materialize::{MaterializationPlan, MaterializationPreview};
pub use propagation::{ChangeField, Classification, LessonDiff, PropagationPlan, SiblingUpdate};
