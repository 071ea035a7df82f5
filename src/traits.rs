//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::*;

/// Storage abstraction for the reconciliation system
///
/// This trait allows the reconciliation core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// The payment store is append-only per date except for in-place status
/// updates; the expectation store maps each date to its per-ticket expected
/// amounts.
#[async_trait]
pub trait ReconciliationStorage: Send + Sync {
    /// Append payments to a date, preserving insertion order
    async fn append_payments(&mut self, date: NaiveDate, payments: &[Payment]) -> ReconResult<()>;

    /// Get all payments for a date, in insertion order (empty if none)
    async fn get_payments(&self, date: NaiveDate) -> ReconResult<Vec<Payment>>;

    /// List all dates that have payments, ascending
    async fn payment_dates(&self) -> ReconResult<Vec<NaiveDate>>;

    /// Overwrite the status of every payment on `date` whose ticket appears
    /// in `statuses`
    async fn update_statuses(
        &mut self,
        date: NaiveDate,
        statuses: &[(String, PaymentStatus)],
    ) -> ReconResult<()>;

    /// Replace the entire expectation map for a date
    async fn replace_expected(&mut self, date: NaiveDate, expected: ExpectedAmounts)
        -> ReconResult<()>;

    /// Merge expectations for a date, overwriting per ticket
    async fn merge_expected(&mut self, date: NaiveDate, expected: ExpectedAmounts)
        -> ReconResult<()>;

    /// Get the expectation map for a date (empty if none)
    async fn get_expected(&self, date: NaiveDate) -> ReconResult<ExpectedAmounts>;
}

/// Trait for determining the card brand of a credit card payment
///
/// Brand detection from the sales file is a stub interface: the default
/// implementation is a first-digit parity heuristic with no business
/// authority behind it, meant to be swapped for a real BIN lookup or a
/// file-column-based determination.
pub trait BrandDetector: Send + Sync {
    /// Determine the settlement brand for an order id
    fn detect(&self, order_id: &str) -> PaymentMethod;
}

/// Default brand detector: odd leading digit maps to Mastercard, even to
/// Visa, anything unparsable to Mastercard
pub struct FirstDigitBrandDetector;

impl BrandDetector for FirstDigitBrandDetector {
    fn detect(&self, order_id: &str) -> PaymentMethod {
        match order_id.chars().next().and_then(|c| c.to_digit(10)) {
            Some(digit) if digit % 2 == 0 => PaymentMethod::Visa,
            _ => PaymentMethod::Mastercard,
        }
    }
}
