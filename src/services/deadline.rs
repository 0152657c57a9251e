//! Submission-deadline calculation from tenant policy.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::AppError;
use crate::models::{DeadlineStrategy, SubmissionPolicy};

/// Derive the submission deadline for a reference month.
///
/// Pure and total for any valid policy. A policy whose strategy does not
/// match its populated offset field is rejected with `InvalidPolicy` rather
/// than silently falling back to a default.
pub fn deadline_for(policy: &SubmissionPolicy, year: i32, month: u32) -> Result<NaiveDate, AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::InvalidPolicy(format!("invalid reference month {}-{}", year, month)))?;
    let last_day = days_in_month(year, month)
        .ok_or_else(|| AppError::InvalidPolicy(format!("invalid reference month {}-{}", year, month)))?;

    match policy.strategy {
        DeadlineStrategy::FixedDay => {
            let day = policy.day.ok_or_else(|| {
                AppError::InvalidPolicy("fixed_day strategy requires a day".to_string())
            })?;
            if !(1..=31).contains(&day) {
                return Err(AppError::InvalidPolicy(format!(
                    "fixed_day must be within 1..=31, got {}",
                    day
                )));
            }
            // Clamp to the last day of short months.
            let day = (day as u32).min(last_day);
            first
                .with_day(day)
                .ok_or_else(|| AppError::InvalidPolicy(format!("day {} not representable", day)))
        }
        DeadlineStrategy::StartOfMonth => {
            let offset = policy.offset_from_start.ok_or_else(|| {
                AppError::InvalidPolicy("start_of_month strategy requires offset_from_start".to_string())
            })?;
            if offset < 0 {
                return Err(AppError::InvalidPolicy(
                    "offset_from_start must be non-negative".to_string(),
                ));
            }
            Ok(first + Duration::days(offset as i64))
        }
        DeadlineStrategy::EndOfMonth => {
            let offset = policy.offset_from_end.ok_or_else(|| {
                AppError::InvalidPolicy("end_of_month strategy requires offset_from_end".to_string())
            })?;
            if offset < 0 {
                return Err(AppError::InvalidPolicy(
                    "offset_from_end must be non-negative".to_string(),
                ));
            }
            let last = first
                .with_day(last_day)
                .ok_or_else(|| AppError::InvalidPolicy("month has no last day".to_string()))?;
            Ok(last - Duration::days(offset as i64))
        }
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}
