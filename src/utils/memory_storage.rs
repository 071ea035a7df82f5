//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Dates are kept in a `BTreeMap` so iteration order matches ascending ISO
/// date order. Cloning shares the underlying maps, matching the storage
/// injection pattern where one instance is owned per deployment.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    payments: Arc<RwLock<BTreeMap<NaiveDate, Vec<Payment>>>>,
    expected: Arc<RwLock<BTreeMap<NaiveDate, ExpectedAmounts>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            payments: Arc::new(RwLock::new(BTreeMap::new())),
            expected: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.payments.write().unwrap().clear();
        self.expected.write().unwrap().clear();
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReconciliationStorage for MemoryStorage {
    async fn append_payments(&mut self, date: NaiveDate, payments: &[Payment]) -> ReconResult<()> {
        self.payments
            .write()
            .unwrap()
            .entry(date)
            .or_default()
            .extend_from_slice(payments);
        Ok(())
    }

    async fn get_payments(&self, date: NaiveDate) -> ReconResult<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .unwrap()
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn payment_dates(&self) -> ReconResult<Vec<NaiveDate>> {
        Ok(self.payments.read().unwrap().keys().copied().collect())
    }

    async fn update_statuses(
        &mut self,
        date: NaiveDate,
        statuses: &[(String, PaymentStatus)],
    ) -> ReconResult<()> {
        let mut payments = self.payments.write().unwrap();
        if let Some(day_payments) = payments.get_mut(&date) {
            for (ticket, status) in statuses {
                for payment in day_payments
                    .iter_mut()
                    .filter(|p| &p.ticket_number == ticket)
                {
                    payment.status = *status;
                }
            }
        }
        Ok(())
    }

    async fn replace_expected(
        &mut self,
        date: NaiveDate,
        expected: ExpectedAmounts,
    ) -> ReconResult<()> {
        self.expected.write().unwrap().insert(date, expected);
        Ok(())
    }

    async fn merge_expected(
        &mut self,
        date: NaiveDate,
        expected: ExpectedAmounts,
    ) -> ReconResult<()> {
        let mut map = self.expected.write().unwrap();
        map.entry(date).or_default().extend(expected);
        Ok(())
    }

    async fn get_expected(&self, date: NaiveDate) -> ReconResult<ExpectedAmounts> {
        Ok(self
            .expected
            .read()
            .unwrap()
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }
}
