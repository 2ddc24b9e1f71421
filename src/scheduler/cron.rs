//! Cron expression handling
//!
//! Task files use familiar 5-field crontab expressions while the
//! scheduling library wants 6 fields with leading seconds. Normalization
//! prepends a zero seconds field so 5-field schedules fire at second
//! zero; 6-field expressions pass through untouched.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;

pub fn normalize_cron(expression: &str) -> Result<String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 => Ok(fields.join(" ")),
        n => Err(anyhow!(
            "Cron expression '{}' has {} fields, expected 5 or 6",
            expression,
            n
        )),
    }
}

/// Normalize and parse, returning the 6-field form on success
pub fn validate_schedule(expression: &str) -> Result<String> {
    let normalized = normalize_cron(expression)?;
    Schedule::from_str(&normalized)
        .with_context(|| format!("Invalid cron expression '{}'", expression))?;
    Ok(normalized)
}

/// Next firing time after `after`, evaluated in the engine timezone
pub fn next_occurrence(
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let normalized = normalize_cron(expression)?;
    let schedule = Schedule::from_str(&normalized)
        .with_context(|| format!("Invalid cron expression '{}'", expression))?;

    let next = schedule
        .after(&after.with_timezone(&timezone))
        .next()
        .map(|t| t.with_timezone(&Utc));
    Ok(next)
}
