use chrono::NaiveDate;
use lesson_engine::engine::{CalendarLesson, annotate};
use lesson_engine::models::Lesson;
use serde_json::{Value, json};

fn calendar_lesson(id: &str, bookings: Option<Vec<Value>>) -> CalendarLesson {
    let day = NaiveDate::from_ymd_opt(2026, 2, 9).expect("valid date");
    CalendarLesson {
        lesson: Lesson {
            id: id.to_string(),
            teacher_id: "t1".to_string(),
            start_time: day.and_hms_opt(10, 0, 0).expect("valid time"),
            end_time: day.and_hms_opt(11, 0, 0).expect("valid time"),
            capacity: 4,
            subject: "Maths".to_string(),
            color: "#336699".to_string(),
            enrolled_student_ids: Default::default(),
            template_lesson_id: None,
        },
        bookings,
    }
}

#[test]
fn test_null_bookings_do_not_panic_and_are_filtered() {
    let lessons = vec![calendar_lesson("l1", None)];
    let annotated = annotate(&lessons, &["s1"]);
    assert_eq!(annotated.len(), 1);
    assert!(annotated[0].is_filtered);
}

#[test]
fn test_empty_selection_filters_nothing() {
    let lessons = vec![
        calendar_lesson("l1", None),
        calendar_lesson("l2", Some(vec![json!({"student_id": "s1"})])),
        calendar_lesson("l3", Some(vec![])),
    ];
    let none: [&str; 0] = [];
    assert!(annotate(&lessons, &none).iter().all(|l| !l.is_filtered));
    // whitespace-only selections count as empty
    assert!(annotate(&lessons, &["  "]).iter().all(|l| !l.is_filtered));
}

#[test]
fn test_selection_uses_or_semantics_across_students() {
    let lessons = vec![
        calendar_lesson("l1", Some(vec![json!({"id": "b1", "student_id": "s1"})])),
        calendar_lesson("l2", Some(vec![json!({"student_id": "s2"}), json!({"student_id": "s5"})])),
        calendar_lesson("l3", Some(vec![json!({"student_id": "s3"})])),
    ];
    let annotated = annotate(&lessons, &["s1".to_string(), "s2".to_string()]);
    let flags: Vec<bool> = annotated.iter().map(|l| l.is_filtered).collect();
    assert_eq!(flags, vec![false, false, true]);
}

#[test]
fn test_booking_shapes_and_cancelled_bookings() {
    let lessons = vec![
        calendar_lesson("scalar", Some(vec![json!(" s1 ")])),
        calendar_lesson("nested", Some(vec![json!({"student": {"id": "s1"}})])),
        calendar_lesson(
            "cancelled",
            Some(vec![json!({"student_id": "s1", "status": "cancelled"})]),
        ),
        calendar_lesson("case", Some(vec![json!({"student_id": "S1"})])),
    ];
    let flags: Vec<bool> = annotate(&lessons, &["s1"]).iter().map(|l| l.is_filtered).collect();
    assert_eq!(flags, vec![false, false, true, true]);
}

#[test]
fn test_calendar_lesson_deserializes_with_null_bookings() {
    let raw = json!({
        "id": "l1",
        "teacherId": "t1",
        "startTime": "2026-02-09T10:00:00",
        "endTime": "2026-02-09T11:00:00",
        "capacity": 2,
        "subject": "Maths",
        "color": "#336699",
        "bookings": null
    });
    let lesson: CalendarLesson = serde_json::from_value(raw).expect("valid calendar lesson");
    assert!(lesson.bookings.is_none());
    assert!(lesson.lesson.enrolled_student_ids.is_empty());
    assert!(annotate(&[lesson], &["s1"])[0].is_filtered);
}
