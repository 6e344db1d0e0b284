use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use lesson_engine::ValidationError;
use lesson_engine::engine::gate::Intent;
use lesson_engine::engine::materialize::{
    exclude_already_materialized, materialize, plan, preview, week_start_midnight,
    week_start_monday,
};
use lesson_engine::models::TemplateLesson;
use serde_json::{Value, json};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn slot(id: &str, day_of_week: u8, start: NaiveTime, end: NaiveTime, capacity: u32, assigned: Value) -> TemplateLesson {
    TemplateLesson {
        id: id.to_string(),
        day_of_week,
        start_time: start,
        end_time: end,
        teacher_id: "t1".to_string(),
        capacity,
        subject: "Maths".to_string(),
        color: "#336699".to_string(),
        assigned_student_ids: assigned,
    }
}

#[test]
fn test_week_start_monday_for_every_day_of_week() {
    let monday = date(2026, 1, 19);
    for offset in 0..7 {
        let day = monday + Duration::days(offset);
        assert_eq!(week_start_monday(day), monday, "day {}", day);
    }
    // Sunday belongs to the week before, not the following one
    assert_eq!(week_start_monday(date(2026, 1, 25)), monday);
    assert_eq!(week_start_monday(date(2026, 1, 26)), date(2026, 1, 26));
    assert_eq!(
        week_start_midnight(date(2026, 1, 22)),
        monday.and_hms_opt(0, 0, 0).expect("valid time")
    );
}

#[test]
fn test_materialize_monday_template_onto_week() {
    let template = vec![slot("tpl-1", 1, time(10, 0), time(11, 0), 2, json!(["s1", "s2"]))];
    let today = date(2026, 2, 4);

    let plan = plan(&template, date(2026, 2, 9), today).expect("future week");
    assert_eq!(plan.lessons.len(), 1);

    let lesson = &plan.lessons[0];
    assert_eq!(lesson.start_time, date(2026, 2, 9).and_hms_opt(10, 0, 0).expect("valid time"));
    assert_eq!(lesson.end_time, date(2026, 2, 9).and_hms_opt(11, 0, 0).expect("valid time"));
    assert_eq!(
        lesson.enrolled_student_ids,
        ["s1", "s2"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );
    assert_eq!(lesson.template_lesson_id.as_deref(), Some("tpl-1"));
    assert_eq!(lesson.capacity, 2);
    assert_eq!(lesson.teacher_id, "t1");

    // pre-assigned rosters book without debiting credits
    assert_eq!(plan.booking_intents.len(), 2);
    assert!(
        plan.booking_intents
            .iter()
            .all(|i| matches!(i, Intent::CreateBooking { .. }))
    );
}

#[test]
fn test_materialize_anchors_to_monday_and_places_sunday_last() {
    let template = vec![
        slot("sun", 0, time(9, 0), time(10, 0), 1, Value::Null),
        slot("wed", 3, time(14, 30), time(15, 15), 1, Value::Null),
    ];
    // any day of the target week works as the anchor
    let lessons = materialize(&template, date(2026, 2, 12), date(2026, 2, 1)).expect("future week");

    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].template_lesson_id.as_deref(), Some("wed"));
    assert_eq!(lessons[0].start_time, date(2026, 2, 11).and_hms_opt(14, 30, 0).expect("valid time"));
    assert_eq!(lessons[1].template_lesson_id.as_deref(), Some("sun"));
    assert_eq!(lessons[1].start_time, date(2026, 2, 15).and_hms_opt(9, 0, 0).expect("valid time"));
    assert!(lessons[0].enrolled_student_ids.is_empty());
    assert_ne!(lessons[0].id, lessons[1].id);
}

#[test]
fn test_materialize_rejects_past_week() {
    let template = vec![slot("tpl-1", 1, time(10, 0), time(11, 0), 2, json!(["s1"]))];
    let today = date(2026, 1, 21);

    let result = materialize(&template, date(2026, 1, 12), today);
    assert_eq!(
        result,
        Err(ValidationError::PastWeek {
            week_start: date(2026, 1, 12),
            current_week_start: date(2026, 1, 19),
        })
    );
}

#[test]
fn test_materialize_allows_current_week() {
    let template = vec![slot("tpl-1", 1, time(10, 0), time(11, 0), 2, Value::Null)];
    // Monday of the current week is not "past" even on a Sunday
    let lessons = materialize(&template, date(2026, 1, 19), date(2026, 1, 25)).expect("current week");
    assert_eq!(lessons.len(), 1);
}

#[test]
fn test_materialize_rejects_roster_over_capacity_without_partial_output() {
    let template = vec![
        slot("ok", 2, time(10, 0), time(11, 0), 3, json!(["s1"])),
        slot("over", 4, time(10, 0), time(11, 0), 1, json!(["s1", {"student_id": "s2"}])),
    ];
    let result = materialize(&template, date(2026, 3, 2), date(2026, 2, 1));
    assert_eq!(
        result,
        Err(ValidationError::CapacityExceeded {
            capacity: 1,
            requested: 2,
        })
    );
}

#[test]
fn test_materialize_rejects_invalid_slots() {
    let today = date(2026, 2, 1);
    let week = date(2026, 3, 2);

    let bad_day = vec![slot("x", 7, time(10, 0), time(11, 0), 1, Value::Null)];
    assert_eq!(materialize(&bad_day, week, today), Err(ValidationError::InvalidDayOfWeek(7)));

    let bad_capacity = vec![slot("x", 1, time(10, 0), time(11, 0), 0, Value::Null)];
    assert_eq!(materialize(&bad_capacity, week, today), Err(ValidationError::InvalidCapacity(0)));

    let bad_range = vec![slot("x", 1, time(11, 0), time(10, 0), 1, Value::Null)];
    assert!(matches!(
        materialize(&bad_range, week, today),
        Err(ValidationError::InvalidTimeRange { .. })
    ));
}

#[test]
fn test_preview_reports_counts_impact_and_roster() {
    let template = vec![
        slot("mon", 1, time(10, 0), time(11, 0), 2, json!(["s1", "s2"])),
        slot("thu", 4, time(10, 0), time(11, 0), 3, json!([{"id": "s1"}, {"student_id": "s3"}])),
        slot("fri", 5, time(10, 0), time(11, 0), 3, json!([])),
    ];
    let preview = preview(&template, date(2026, 2, 9), date(2026, 2, 1)).expect("future week");

    assert_eq!(preview.week_start, date(2026, 2, 9));
    assert_eq!(preview.lesson_count, 3);
    assert_eq!(preview.credit_impact.get("s1"), Some(&2));
    assert_eq!(preview.credit_impact.get("s2"), Some(&1));
    assert_eq!(preview.credit_impact.get("s3"), Some(&1));
    assert_eq!(preview.roster.len(), 3);
}

#[test]
fn test_preview_rejects_past_week() {
    let template = vec![slot("mon", 1, time(10, 0), time(11, 0), 2, Value::Null)];
    assert!(matches!(
        preview(&template, date(2026, 1, 5), date(2026, 2, 1)),
        Err(ValidationError::PastWeek { .. })
    ));
}

#[test]
fn test_exclude_already_materialized() {
    let template = vec![
        slot("mon", 1, time(10, 0), time(11, 0), 2, Value::Null),
        slot("tue", 2, time(10, 0), time(11, 0), 2, Value::Null),
    ];
    let today = date(2026, 2, 1);
    let existing = materialize(&template[..1], date(2026, 2, 9), today).expect("future week");
    let planned = materialize(&template, date(2026, 2, 9), today).expect("future week");

    let remaining = exclude_already_materialized(planned, &existing);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].template_lesson_id.as_deref(), Some("tue"));
}
