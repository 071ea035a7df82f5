//! Daily dashboard and day-detail views

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reports::transactions::TransactionRecord;
use crate::traits::ReconciliationStorage;
use crate::types::*;

/// Received amount per settlement method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodBreakdown {
    pub mastercard: BigDecimal,
    pub visa: BigDecimal,
    pub pix: BigDecimal,
    pub boleto: BigDecimal,
}

impl MethodBreakdown {
    /// Breakdown over a set of payments
    pub fn from_payments<'a, I>(payments: I) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let mut breakdown = Self::default();
        for payment in payments {
            breakdown.add(payment.method, &payment.amount);
        }
        breakdown
    }

    pub fn add(&mut self, method: PaymentMethod, amount: &BigDecimal) {
        match method {
            PaymentMethod::Mastercard => self.mastercard += amount,
            PaymentMethod::Visa => self.visa += amount,
            PaymentMethod::Pix => self.pix += amount,
            PaymentMethod::Boleto => self.boleto += amount,
        }
    }

    pub fn get(&self, method: PaymentMethod) -> &BigDecimal {
        match method {
            PaymentMethod::Mastercard => &self.mastercard,
            PaymentMethod::Visa => &self.visa,
            PaymentMethod::Pix => &self.pix,
            PaymentMethod::Boleto => &self.boleto,
        }
    }

    pub fn total(&self) -> BigDecimal {
        &self.mastercard + &self.visa + &self.pix + &self.boleto
    }

    /// Merge another breakdown into this one (used by history rollups)
    pub fn merge(&mut self, other: &MethodBreakdown) {
        self.mastercard += &other.mastercard;
        self.visa += &other.visa;
        self.pix += &other.pix;
        self.boleto += &other.boleto;
    }

    /// Each method's share of the total received amount, rounded to one
    /// decimal; all zero when nothing was received
    pub fn percentages(&self) -> MethodPercentages {
        let total = self.total().to_f64().unwrap_or(0.0);
        let share = |amount: &BigDecimal| {
            if total > 0.0 {
                let pct = amount.to_f64().unwrap_or(0.0) / total * 100.0;
                (pct * 10.0).round() / 10.0
            } else {
                0.0
            }
        };
        MethodPercentages {
            mastercard: share(&self.mastercard),
            visa: share(&self.visa),
            pix: share(&self.pix),
            boleto: share(&self.boleto),
        }
    }
}

/// Per-method share of the received amount, in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodPercentages {
    pub mastercard: f64,
    pub visa: f64,
    pub pix: f64,
    pub boleto: f64,
}

/// Payment counts per reconciliation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub reconciled: usize,
    pub pending: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn from_payments<'a, I>(payments: I) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let mut counts = Self::default();
        for payment in payments {
            match payment.status {
                PaymentStatus::Reconciled => counts.reconciled += 1,
                PaymentStatus::Pending => counts.pending += 1,
                PaymentStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.reconciled + self.pending + self.error
    }

    /// Integer-rounded percentage per status; all zero when there are no
    /// payments
    pub fn percentages(&self) -> StatusPercentages {
        let total = self.total();
        if total == 0 {
            return StatusPercentages::default();
        }
        let pct = |count: usize| ((count as f64 / total as f64) * 100.0).round() as u32;
        StatusPercentages {
            reconciled: pct(self.reconciled),
            pending: pct(self.pending),
            error: pct(self.error),
        }
    }
}

/// Integer-rounded percentage of payments per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPercentages {
    pub reconciled: u32,
    pub pending: u32,
    pub error: u32,
}

/// Dashboard summary for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub date: NaiveDate,
    pub expected_amount: BigDecimal,
    pub received_amount: BigDecimal,
    /// Received minus expected
    pub difference: BigDecimal,
    /// Reconciled when the difference is exactly zero, otherwise pending
    pub status: PaymentStatus,
    pub payment_methods: MethodBreakdown,
    pub payment_methods_percentages: MethodPercentages,
    pub status_counts: StatusCounts,
    pub status_percentages: StatusPercentages,
}

/// Dashboard plus the flattened transaction list for a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDetailView {
    #[serde(flatten)]
    pub dashboard: DashboardView,
    pub transactions: Vec<TransactionRecord>,
}

impl<S: ReconciliationStorage + Clone> crate::reconciliation::ReconciliationService<S> {
    /// Build the dashboard view for a date
    ///
    /// Never fails: a date without payments yields a zeroed view.
    pub async fn dashboard(&self, date: NaiveDate) -> ReconResult<DashboardView> {
        let payments = self.storage.get_payments(date).await?;
        let expected_map = self.storage.get_expected(date).await?;

        let expected_amount: BigDecimal = expected_map.values().sum();
        let received_amount: BigDecimal = payments.iter().map(|p| &p.amount).sum();
        let difference = &received_amount - &expected_amount;

        let status = if difference == BigDecimal::from(0) {
            PaymentStatus::Reconciled
        } else {
            PaymentStatus::Pending
        };

        let payment_methods = MethodBreakdown::from_payments(&payments);
        let status_counts = StatusCounts::from_payments(&payments);

        Ok(DashboardView {
            date,
            expected_amount,
            received_amount,
            difference,
            status,
            payment_methods_percentages: payment_methods.percentages(),
            payment_methods,
            status_percentages: status_counts.percentages(),
            status_counts,
        })
    }

    /// Dashboard plus transaction list for a date
    ///
    /// Unlike [`dashboard`], fails with `NoPaymentsForDate` when the date has
    /// no payment history.
    ///
    /// [`dashboard`]: Self::dashboard
    pub async fn day_detail(&self, date: NaiveDate) -> ReconResult<DayDetailView> {
        let payments = self.storage.get_payments(date).await?;
        if payments.is_empty() {
            return Err(ReconciliationError::NoPaymentsForDate(date));
        }

        let dashboard = self.dashboard(date).await?;
        let transactions = payments.iter().map(TransactionRecord::from_payment).collect();

        Ok(DayDetailView {
            dashboard,
            transactions,
        })
    }
}
