//! Canonical student identities.
//!
//! Upstream payloads carry student references as bare scalars, `{id}` objects or
//! `{student_id}` objects depending on which endpoint produced them. Every
//! comparison of identities in this crate goes through [`normalize`].

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::models::StudentId;

/// Objects resolve to `id`, then `student_id`; a null field counts as absent.
pub fn normalize_one(value: &Value) -> Option<StudentId> {
    let scalar = match value {
        Value::Object(map) => match (map.get("id"), map.get("student_id")) {
            (Some(id), _) if !id.is_null() => id,
            (_, Some(student_id)) if !student_id.is_null() => student_id,
            _ => {
                debug!("identity object has neither id nor student_id: {}", value);
                return None;
            }
        },
        other => other,
    };

    let raw = match scalar {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            debug!("dropping non-scalar identity value: {}", other);
            return None;
        }
    };

    if raw.is_empty() { None } else { Some(raw) }
}

pub fn normalize(ids: &Value) -> BTreeSet<StudentId> {
    match ids {
        Value::Array(items) => normalize_all(items),
        Value::Null => BTreeSet::new(),
        other => {
            debug!("identity collection is not an array: {}", other);
            BTreeSet::new()
        }
    }
}

pub fn normalize_all<'a>(items: impl IntoIterator<Item = &'a Value>) -> BTreeSet<StudentId> {
    items.into_iter().filter_map(normalize_one).collect()
}

pub fn normalize_strs<S: AsRef<str>>(ids: &[S]) -> BTreeSet<StudentId> {
    ids.iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn changed(old_ids: &Value, new_ids: &Value) -> bool {
    let old = normalize(old_ids);
    let new = normalize(new_ids);
    old.len() != new.len() || old.symmetric_difference(&new).next().is_some()
}

/// Student id referenced by a booking record. Prefers `student_id` (and a nested
/// `student`) over `id`, which on a booking usually names the booking itself.
pub fn booking_student_id(booking: &Value) -> Option<StudentId> {
    if let Value::Object(map) = booking {
        for key in ["student_id", "studentId", "student"] {
            if let Some(v) = map.get(key).filter(|v| !v.is_null()) {
                return normalize_one(v);
            }
        }
    }
    normalize_one(booking)
}
