use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::gate::Intent;
use crate::engine::identity;
use crate::models::{CreditBalance, StudentId};

/// How the ledger came to be. Anything but `Loaded` means "credits unknown",
/// and every balance reads as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Loaded,
    Empty,
    Unrecognized,
    Unavailable { reason: String },
}

#[derive(Debug)]
enum CreditResponse<'a> {
    /// `[{user_id, balance}, ...]`
    List(&'a [Value]),
    /// `{balances: [{user_id, balance}, ...]}`
    Wrapped(&'a [Value]),
    /// `{user_id, balance}`, returned to a non-privileged caller asking for its own balance.
    Single(&'a Value),
}

impl<'a> CreditResponse<'a> {
    fn decode(response: &'a Value) -> Option<Self> {
        match response {
            Value::Array(items) => Some(CreditResponse::List(items)),
            Value::Object(map) => match map.get("balances") {
                Some(Value::Array(items)) => Some(CreditResponse::Wrapped(items)),
                Some(_) => None,
                None if map.contains_key("user_id") => Some(CreditResponse::Single(response)),
                None => None,
            },
            _ => None,
        }
    }

    fn entries(&self) -> &'a [Value] {
        match self {
            CreditResponse::List(items) | CreditResponse::Wrapped(items) => *items,
            CreditResponse::Single(entry) => std::slice::from_ref(*entry),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditLedger {
    balances: HashMap<StudentId, CreditBalance>,
    status: LedgerStatus,
}

impl CreditLedger {
    pub fn build(response: &Value) -> Self {
        let Some(decoded) = CreditResponse::decode(response) else {
            if !response.is_null() {
                warn!("unrecognized credits response shape, treating credits as unknown");
            }
            return Self {
                balances: HashMap::new(),
                status: LedgerStatus::Unrecognized,
            };
        };

        let mut balances = HashMap::new();
        for entry in decoded.entries() {
            let Some(user_id) = entry.get("user_id").and_then(identity::normalize_one) else {
                debug!("skipping credit entry without user_id: {}", entry);
                continue;
            };
            let balance = coerce_balance(entry.get("balance"));
            if balances.insert(user_id.clone(), balance).is_some() {
                debug!("duplicate credit entry for {}, keeping the last one", user_id);
            }
        }

        let status = if balances.is_empty() {
            LedgerStatus::Empty
        } else {
            LedgerStatus::Loaded
        };
        Self { balances, status }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            balances: HashMap::new(),
            status: LedgerStatus::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn balance_of(&self, student_id: &str) -> CreditBalance {
        self.balances.get(student_id.trim()).copied().unwrap_or(0)
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.balances.contains_key(student_id.trim())
    }

    pub fn status(&self) -> &LedgerStatus {
        &self.status
    }

    pub fn is_known(&self) -> bool {
        self.status == LedgerStatus::Loaded
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn with_intents(&self, intents: &[Intent]) -> Self {
        let mut next = self.clone();
        for intent in intents {
            match intent {
                Intent::Debit { student_id, amount } => {
                    *next.balances.entry(student_id.clone()).or_insert(0) -= *amount;
                }
                Intent::Refund { student_id, amount } => {
                    *next.balances.entry(student_id.clone()).or_insert(0) += *amount;
                }
                Intent::CreateBooking { .. } | Intent::CancelBooking { .. } => {}
            }
        }
        next
    }
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
fn in_balance_range(f: f64) -> bool {
    f >= CreditBalance::MIN as f64 && f < CreditBalance::MAX as f64
}

pub fn coerce_balance(raw: Option<&Value>) -> CreditBalance {
    match raw {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                v
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && in_balance_range(f) => f as CreditBalance,
                    _ => {
                        warn!("rejecting non-integer or out-of-range credit balance {}", n);
                        0
                    }
                }
            }
        }
        Some(Value::String(s)) => s.trim().parse::<CreditBalance>().unwrap_or_else(|_| {
            warn!("rejecting unparseable credit balance {:?}", s);
            0
        }),
        Some(other) => {
            warn!("rejecting credit balance of unexpected type: {}", other);
            0
        }
    }
}
