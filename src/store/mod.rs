use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::engine::LessonDiff;
use crate::error::EngineError;
use crate::models::{Booking, BookingAction, Lesson};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "payload", rename_all = "snake_case")]
pub enum LessonChange {
    Create(Lesson),
    Update(LessonDiff),
    Delete,
}

/// Credits are expected to move with booking create/cancel on the store's side.
#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn fetch_credits(&self) -> Result<Value, EngineError>;
    async fn fetch_bookings(&self, lesson_id: &str) -> Result<Vec<Booking>, EngineError>;
    async fn persist_booking(
        &self,
        lesson_id: &str,
        student_id: &str,
        action: BookingAction,
    ) -> Result<(), EngineError>;
    async fn persist_lesson_change(
        &self,
        lesson_id: &str,
        change: &LessonChange,
    ) -> Result<(), EngineError>;
}

pub struct NoopLessonStore;

#[async_trait]
impl LessonStore for NoopLessonStore {
    async fn fetch_credits(&self) -> Result<Value, EngineError> {
        Ok(Value::Array(Vec::new()))
    }

    async fn fetch_bookings(&self, _lesson_id: &str) -> Result<Vec<Booking>, EngineError> {
        Ok(Vec::new())
    }

    async fn persist_booking(
        &self,
        _lesson_id: &str,
        _student_id: &str,
        _action: BookingAction,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    async fn persist_lesson_change(
        &self,
        _lesson_id: &str,
        _change: &LessonChange,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}
