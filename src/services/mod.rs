pub mod enrollment_service;
pub mod schedule_service;

pub use enrollment_service::{EnrollmentOutcome, EnrollmentService, ReleaseStats};
pub use schedule_service::{FailedBooking, MaterializeStats, PropagationStats, ScheduleService};
