//! Per-ticket matching and status classification

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

use crate::traits::*;
use crate::types::*;

/// Reconciliation engine matching received payments against expectations
///
/// Classification compares decimals exactly; there is no tolerance anywhere
/// in the crate. Re-running a date overwrites statuses in place, so the run
/// is idempotent on unchanged data.
pub struct ReconciliationEngine<S: ReconciliationStorage> {
    pub(crate) storage: S,
}

impl<S: ReconciliationStorage> ReconciliationEngine<S> {
    /// Create a new engine over the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Reconcile all payments of one date against its expected amounts
    ///
    /// When no expectations exist for the date they are synthesized from the
    /// payments themselves (each ticket expects its first received amount)
    /// and persisted, so the date reconciles trivially until amounts change.
    /// Fails with `NoPaymentsForDate` when the date has no payment history.
    pub async fn reconcile(&mut self, date: NaiveDate) -> ReconResult<ReconciliationReport> {
        let payments = self.storage.get_payments(date).await?;
        if payments.is_empty() {
            return Err(ReconciliationError::NoPaymentsForDate(date));
        }

        let mut expected = self.storage.get_expected(date).await?;
        if expected.is_empty() {
            for payment in &payments {
                expected
                    .entry(payment.ticket_number.clone())
                    .or_insert_with(|| payment.amount.clone());
            }
            self.storage.replace_expected(date, expected.clone()).await?;
        }

        // Received totals per ticket, ordered for deterministic output
        let mut received: BTreeMap<String, BigDecimal> = BTreeMap::new();
        for payment in &payments {
            *received
                .entry(payment.ticket_number.clone())
                .or_insert_with(|| BigDecimal::from(0)) += &payment.amount;
        }

        let zero = BigDecimal::from(0);
        let mut reconciled = Vec::new();
        let mut pending = Vec::new();
        let mut errors = Vec::new();
        let mut statuses = Vec::new();

        for (ticket, received_amount) in &received {
            let expected_amount = expected.get(ticket).cloned().unwrap_or_else(|| zero.clone());

            let entry = if *received_amount == expected_amount {
                TicketMatch {
                    ticket: ticket.clone(),
                    expected: expected_amount,
                    received: received_amount.clone(),
                    difference: zero.clone(),
                    status: PaymentStatus::Reconciled,
                }
            } else if expected_amount > *received_amount {
                TicketMatch {
                    ticket: ticket.clone(),
                    difference: &expected_amount - received_amount,
                    expected: expected_amount,
                    received: received_amount.clone(),
                    status: PaymentStatus::Pending,
                }
            } else {
                TicketMatch {
                    ticket: ticket.clone(),
                    difference: received_amount - &expected_amount,
                    expected: expected_amount,
                    received: received_amount.clone(),
                    status: PaymentStatus::Error,
                }
            };

            statuses.push((ticket.clone(), entry.status));
            match entry.status {
                PaymentStatus::Reconciled => reconciled.push(entry),
                PaymentStatus::Pending => pending.push(entry),
                PaymentStatus::Error => errors.push(entry),
            }
        }

        // Tickets expected but never paid
        for (ticket, expected_amount) in &expected {
            if !received.contains_key(ticket) {
                pending.push(TicketMatch {
                    ticket: ticket.clone(),
                    expected: expected_amount.clone(),
                    received: zero.clone(),
                    difference: expected_amount.clone(),
                    status: PaymentStatus::Pending,
                });
            }
        }
        pending.sort_by(|a, b| a.ticket.cmp(&b.ticket));

        self.storage.update_statuses(date, &statuses).await?;

        let total_tickets = received.len()
            + expected
                .keys()
                .filter(|ticket| !received.contains_key(*ticket))
                .count();

        let summary = ReconciliationSummary {
            total_tickets,
            reconciled_count: reconciled.len(),
            pending_count: pending.len(),
            error_count: errors.len(),
        };

        info!(
            %date,
            total_tickets = summary.total_tickets,
            reconciled = summary.reconciled_count,
            pending = summary.pending_count,
            errors = summary.error_count,
            "reconciliation complete"
        );

        Ok(ReconciliationReport {
            date,
            reconciled,
            pending,
            errors,
            summary,
        })
    }
}
