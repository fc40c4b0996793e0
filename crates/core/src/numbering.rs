//! Business identifier sequences.
//!
//! Three independent sequences, each a three-digit (minimum) counter:
//!
//! - request numbers `REQ###`, continuing from the most recently created PTW task;
//! - task numbers `TASK-YYYY-MM-###`, restarting every calendar month;
//! - permit numbers `ZTPN-YYYY-MM-###`, restarting every calendar month.
//!
//! The repository layer fetches the candidate identifiers and this module does
//! the arithmetic, so the rules are testable without a database.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::CoreError;

pub const REQUEST_PREFIX: &str = "REQ";
pub const TASK_PREFIX: &str = "TASK";
pub const PERMIT_PREFIX: &str = "ZTPN";

/// Counters are zero-padded to at least this many digits.
pub const COUNTER_WIDTH: usize = 3;

/// The three suggested identifiers returned together to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextNumbers {
    pub request_number: String,
    pub task_number: String,
    pub permit_number: String,
}

/// `TASK-2024-01-` style prefix for a month-scoped sequence.
pub fn month_prefix(kind: &str, date: NaiveDate) -> String {
    format!("{kind}-{:04}-{:02}-", date.year(), date.month())
}

pub fn task_number_prefix(date: NaiveDate) -> String {
    month_prefix(TASK_PREFIX, date)
}

pub fn permit_number_prefix(date: NaiveDate) -> String {
    month_prefix(PERMIT_PREFIX, date)
}

fn format_counter(prefix: &str, counter: u32) -> String {
    format!("{prefix}{counter:0width$}", width = COUNTER_WIDTH)
}

/// Parse the counter that follows `prefix` in `candidate`.
///
/// Returns `None` unless the remainder is all ASCII digits.
pub fn parse_counter(candidate: &str, prefix: &str) -> Option<u32> {
    let digits = candidate.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next request number given the `task_id` of the most recently created PTW task.
///
/// Starts over at `REQ001` when there is no previous PTW task or its id does
/// not parse.
pub fn next_request_number(latest_ptw_task_id: Option<&str>) -> String {
    let next = latest_ptw_task_id
        .and_then(|id| parse_counter(id, REQUEST_PREFIX))
        .map_or(1, |n| n.saturating_add(1));
    format_counter(REQUEST_PREFIX, next)
}

/// Next identifier in a month-scoped sequence.
///
/// `existing` holds every identifier already issued under `prefix`; the
/// highest parsable counter wins. Non-matching entries are ignored.
pub fn next_in_sequence<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter_map(|id| parse_counter(id, prefix))
        .max();
    let next = highest.map_or(1, |n| n.saturating_add(1));
    format_counter(prefix, next)
}

/// Parse a month-scoped identifier into `(year, month, counter)`.
fn parse_month_scoped(kind: &str, candidate: &str) -> Option<(i32, u32, u32)> {
    let rest = candidate.strip_prefix(kind)?.strip_prefix('-')?;
    let mut parts = rest.splitn(3, '-');
    let year = parts.next()?;
    let month = parts.next()?;
    let counter = parts.next()?;
    if year.len() != 4 || month.len() != 2 || counter.len() < COUNTER_WIDTH {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(year) || !all_digits(month) || !all_digits(counter) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year.parse().ok()?, month, counter.parse().ok()?))
}

/// Validate a client-supplied PTW request number (`REQ###`).
pub fn validate_request_number(candidate: &str) -> Result<(), CoreError> {
    let well_formed = candidate
        .strip_prefix(REQUEST_PREFIX)
        .is_some_and(|digits| digits.len() >= COUNTER_WIDTH)
        && parse_counter(candidate, REQUEST_PREFIX).is_some();
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid request number '{candidate}'. Expected format REQ###"
        )))
    }
}

/// Validate a client-supplied general task number (`TASK-YYYY-MM-###`).
pub fn validate_task_number(candidate: &str) -> Result<(), CoreError> {
    parse_month_scoped(TASK_PREFIX, candidate)
        .map(|_| ())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid task number '{candidate}'. Expected format TASK-YYYY-MM-###"
            ))
        })
}

/// Validate a permit number (`ZTPN-YYYY-MM-###`).
pub fn validate_permit_number(candidate: &str) -> Result<(), CoreError> {
    parse_month_scoped(PERMIT_PREFIX, candidate)
        .map(|_| ())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid permit number '{candidate}'. Expected format ZTPN-YYYY-MM-###"
            ))
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn jan_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn first_numbers_start_at_001() {
        assert_eq!(next_request_number(None), "REQ001");
        assert_eq!(
            next_in_sequence(&task_number_prefix(jan_2024()), []),
            "TASK-2024-01-001"
        );
        assert_eq!(
            next_in_sequence(&permit_number_prefix(jan_2024()), []),
            "ZTPN-2024-01-001"
        );
    }

    #[test]
    fn request_number_continues_from_latest() {
        assert_eq!(next_request_number(Some("REQ007")), "REQ008");
        assert_eq!(next_request_number(Some("REQ999")), "REQ1000");
    }

    #[test]
    fn unparsable_latest_request_restarts() {
        assert_eq!(next_request_number(Some("TASK-2024-01-004")), "REQ001");
        assert_eq!(next_request_number(Some("REQabc")), "REQ001");
        assert_eq!(next_request_number(Some("REQ")), "REQ001");
    }

    #[test]
    fn month_sequence_takes_highest_counter() {
        let prefix = task_number_prefix(jan_2024());
        let existing = ["TASK-2024-01-002", "TASK-2024-01-010", "TASK-2024-01-003"];
        assert_eq!(next_in_sequence(&prefix, existing), "TASK-2024-01-011");
    }

    #[test]
    fn month_sequence_handles_counters_past_999() {
        let prefix = permit_number_prefix(jan_2024());
        let existing = ["ZTPN-2024-01-999", "ZTPN-2024-01-1000"];
        assert_eq!(next_in_sequence(&prefix, existing), "ZTPN-2024-01-1001");
    }

    #[test]
    fn month_sequence_resets_in_new_month() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let existing = ["ZTPN-2024-01-005"];
        assert_eq!(
            next_in_sequence(&permit_number_prefix(feb), existing),
            "ZTPN-2024-02-001"
        );
    }

    #[test]
    fn sequential_calls_are_strictly_increasing() {
        let prefix = task_number_prefix(jan_2024());
        let mut issued: Vec<String> = Vec::new();
        for expected in 1..=5u32 {
            let next = next_in_sequence(&prefix, issued.iter().map(String::as_str));
            assert_eq!(parse_counter(&next, &prefix), Some(expected));
            issued.push(next);
        }
    }

    #[test]
    fn validates_identifier_formats() {
        assert!(validate_request_number("REQ001").is_ok());
        assert!(validate_request_number("REQ12345").is_ok());
        assert_matches!(validate_request_number("REQ1"), Err(CoreError::Validation(_)));
        assert_matches!(validate_request_number("req001"), Err(CoreError::Validation(_)));

        assert!(validate_task_number("TASK-2024-01-001").is_ok());
        assert!(validate_task_number("TASK-2024-13-001").is_err());
        assert!(validate_task_number("TASK-24-01-001").is_err());
        assert!(validate_task_number("TASK-2024-01-01").is_err());

        assert!(validate_permit_number("ZTPN-2024-01-001").is_ok());
        assert!(validate_permit_number("ZTPN-2024-01-00a").is_err());
        assert!(validate_permit_number("TASK-2024-01-001").is_err());
    }
}
