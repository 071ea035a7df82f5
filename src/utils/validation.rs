//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// Parse an ISO-8601 (`YYYY-MM-DD`) date string
///
/// The external layer calls this before handing dates to the core, so the
/// offending value is surfaced in the error.
pub fn parse_iso_date(date_str: &str) -> ReconResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
        ReconciliationError::Validation(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            date_str
        ))
    })
}

/// Validate that an expected amount is not negative (zero is allowed)
pub fn validate_expected_amount(ticket: &str, amount: &BigDecimal) -> ReconResult<()> {
    if *amount < BigDecimal::from(0) {
        return Err(ReconciliationError::Validation(format!(
            "Negative amount not allowed for ticket {}: {}",
            ticket, amount
        )));
    }
    Ok(())
}

/// Validate a full expectation map before it replaces a date's expectations
pub fn validate_expected_map(expected: &ExpectedAmounts) -> ReconResult<()> {
    for (ticket, amount) in expected {
        validate_expected_amount(ticket, amount)?;
    }
    Ok(())
}
