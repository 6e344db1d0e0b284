pub mod booking;
pub mod lesson;
pub mod template;

pub use booking::{Booking, BookingAction, BookingStatus, active_student_ids};
pub use lesson::Lesson;
pub use template::TemplateLesson;

pub type StudentId = String;

pub type CreditBalance = i64;
