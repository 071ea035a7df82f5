//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Expected amount per ticket for one date
///
/// Ordered map so report output is deterministic.
pub type ExpectedAmounts = BTreeMap<String, BigDecimal>;

/// Logical payment channel the money arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    /// Credit card sales file
    CreditCard,
    /// PIX instant payment statement
    Pix,
    /// Boleto settled through a CNAB bank file
    Boleto,
}

impl PaymentChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentChannel::CreditCard => "credit_card",
            PaymentChannel::Pix => "pix",
            PaymentChannel::Boleto => "boleto",
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement brand or rail the payment is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mastercard,
    Visa,
    Pix,
    Boleto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mastercard => "mastercard",
            PaymentMethod::Visa => "visa",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
        }
    }

    /// All methods, in the order reports break them down
    pub fn all() -> [PaymentMethod; 4] {
        [
            PaymentMethod::Mastercard,
            PaymentMethod::Visa,
            PaymentMethod::Pix,
            PaymentMethod::Boleto,
        ]
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation status of a payment or ticket
///
/// `Pending` is the initial state; only the reconciliation engine moves a
/// payment out of it, and re-running the engine overwrites rather than
/// accumulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Reconciled,
    Error,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Reconciled => "reconciled",
            PaymentStatus::Error => "error",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One received payment event
///
/// Everything except `status` is fixed at construction. Uniqueness of
/// `ticket_number` is scoped to `(date, ticket_number)`, not global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Parking ticket this payment is claimed against
    pub ticket_number: String,
    /// Received amount, strictly positive
    pub amount: BigDecimal,
    /// Logical channel the payment came through
    pub channel: PaymentChannel,
    /// Settlement brand/rail
    pub method: PaymentMethod,
    /// Number of installments, strictly positive
    pub installments: u32,
    /// Full external id from the source file (order id)
    pub transaction_id: String,
    /// Calendar date the payment is attributed to
    pub date: NaiveDate,
    /// Mutable reconciliation status
    pub status: PaymentStatus,
}

impl Payment {
    /// Create a new payment in the `Pending` state
    ///
    /// Fails with a validation error when `amount` or `installments` is not
    /// strictly positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticket_number: String,
        amount: BigDecimal,
        channel: PaymentChannel,
        method: PaymentMethod,
        installments: u32,
        transaction_id: String,
        date: NaiveDate,
    ) -> ReconResult<Self> {
        if amount <= BigDecimal::from(0) {
            return Err(ReconciliationError::Validation(format!(
                "Payment amount must be positive, got {}",
                amount
            )));
        }

        if installments == 0 {
            return Err(ReconciliationError::Validation(
                "Payment installments must be positive".to_string(),
            ));
        }

        Ok(Self {
            ticket_number,
            amount,
            channel,
            method,
            installments,
            transaction_id,
            date,
            status: PaymentStatus::Pending,
        })
    }
}

/// Per-ticket outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMatch {
    /// Ticket identifier
    pub ticket: String,
    /// Expected amount for the ticket
    pub expected: BigDecimal,
    /// Sum of received payments for the ticket
    pub received: BigDecimal,
    /// Absolute gap between expected and received (zero when reconciled)
    pub difference: BigDecimal,
    /// Classification assigned to the ticket
    pub status: PaymentStatus,
}

/// Ticket counts for a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Size of the union of tickets seen in payments and expectations
    pub total_tickets: usize,
    pub reconciled_count: usize,
    pub pending_count: usize,
    pub error_count: usize,
}

/// Structured result of reconciling one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Date the run covered
    pub date: NaiveDate,
    /// Tickets whose received amount equals the expected amount
    pub reconciled: Vec<TicketMatch>,
    /// Tickets still owing money (expected > received), including tickets
    /// with no payments at all
    pub pending: Vec<TicketMatch>,
    /// Tickets that received more than expected
    pub errors: Vec<TicketMatch>,
    /// Ticket counts; counts always add up to `total_tickets`
    pub summary: ReconciliationSummary,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Required columns missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No valid payment records found in file")]
    NoValidRecords,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("No payments found for date {0}")]
    NoPaymentsForDate(NaiveDate),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn payment_construction_validates_amount() {
        let result = Payment::new(
            "abc12345".to_string(),
            BigDecimal::from(0),
            PaymentChannel::CreditCard,
            PaymentMethod::Visa,
            1,
            "abc12345-full".to_string(),
            date(),
        );
        assert!(matches!(result, Err(ReconciliationError::Validation(_))));
    }

    #[test]
    fn payment_construction_validates_installments() {
        let result = Payment::new(
            "abc12345".to_string(),
            BigDecimal::from(100),
            PaymentChannel::CreditCard,
            PaymentMethod::Visa,
            0,
            "abc12345-full".to_string(),
            date(),
        );
        assert!(matches!(result, Err(ReconciliationError::Validation(_))));
    }

    #[test]
    fn new_payment_starts_pending() {
        let payment = Payment::new(
            "abc12345".to_string(),
            BigDecimal::from(50),
            PaymentChannel::CreditCard,
            PaymentMethod::Mastercard,
            2,
            "abc12345-full".to_string(),
            date(),
        )
        .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Reconciled).unwrap();
        assert_eq!(json, "\"reconciled\"");
        let json = serde_json::to_string(&PaymentChannel::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
    }
}
