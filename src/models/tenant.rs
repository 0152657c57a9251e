//! Tenant model - the isolation boundary and its submission policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a tenant derives the monthly submission deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "deadline_strategy", rename_all = "snake_case")]
pub enum DeadlineStrategy {
    FixedDay,
    StartOfMonth,
    EndOfMonth,
}

impl DeadlineStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineStrategy::FixedDay => "fixed_day",
            DeadlineStrategy::StartOfMonth => "start_of_month",
            DeadlineStrategy::EndOfMonth => "end_of_month",
        }
    }
}

/// Tenant entity. The reminder day settings are surfaced to the notification
/// collaborator and never gate any transition.
#[derive(Debug, Clone, FromRow)]
pub struct Tenant {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub deadline_strategy: DeadlineStrategy,
    pub deadline_day: Option<i32>,
    pub offset_from_start: Option<i32>,
    pub offset_from_end: Option<i32>,
    pub reminder_first_day: Option<i32>,
    pub reminder_second_day: Option<i32>,
    pub created_utc: DateTime<Utc>,
}

impl Tenant {
    pub fn new(tenant_name: String, strategy: DeadlineStrategy) -> Self {
        Self {
            tenant_id: Uuid::new_v4(),
            tenant_name,
            deadline_strategy: strategy,
            deadline_day: None,
            offset_from_start: None,
            offset_from_end: None,
            reminder_first_day: None,
            reminder_second_day: None,
            created_utc: Utc::now(),
        }
    }

    /// The deadline configuration consumed by the deadline calculator.
    pub fn submission_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            strategy: self.deadline_strategy,
            day: self.deadline_day,
            offset_from_start: self.offset_from_start,
            offset_from_end: self.offset_from_end,
        }
    }
}

/// Submission-deadline configuration. Exactly one of the optional fields is
/// meaningful per strategy; the calculator rejects a mismatch rather than
/// picking a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub strategy: DeadlineStrategy,
    pub day: Option<i32>,
    pub offset_from_start: Option<i32>,
    pub offset_from_end: Option<i32>,
}

impl SubmissionPolicy {
    pub fn fixed_day(day: i32) -> Self {
        Self {
            strategy: DeadlineStrategy::FixedDay,
            day: Some(day),
            offset_from_start: None,
            offset_from_end: None,
        }
    }

    pub fn start_of_month(offset: i32) -> Self {
        Self {
            strategy: DeadlineStrategy::StartOfMonth,
            day: None,
            offset_from_start: Some(offset),
            offset_from_end: None,
        }
    }

    pub fn end_of_month(offset: i32) -> Self {
        Self {
            strategy: DeadlineStrategy::EndOfMonth,
            day: None,
            offset_from_start: None,
            offset_from_end: Some(offset),
        }
    }
}
