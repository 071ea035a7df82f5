//! Flattened transaction views with filtering and pagination

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::traits::ReconciliationStorage;
use crate::types::*;

/// Site label attached to every transaction record
///
/// The system currently serves a single parking site; a multi-site rollout
/// would source this from the payment itself.
pub const SITE_LABEL: &str = "Estacionamento Centro";

/// One payment flattened for listing and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Full external transaction id
    pub id: String,
    /// Display date, DD/MM/YYYY
    pub date: String,
    /// Parking site label
    pub location: String,
    /// Settlement method
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub status: PaymentStatus,
}

impl TransactionRecord {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            id: payment.transaction_id.clone(),
            date: payment.date.format("%d/%m/%Y").to_string(),
            location: SITE_LABEL.to_string(),
            method: payment.method,
            amount: payment.amount.clone(),
            status: payment.status,
        }
    }

    /// Case-insensitive substring match against the string form of any field
    fn matches_search(&self, needle: &str) -> bool {
        let fields = [
            self.id.to_lowercase(),
            self.date.clone(),
            self.location.to_lowercase(),
            self.method.as_str().to_string(),
            self.amount.to_string(),
            self.status.as_str().to_string(),
        ];
        fields.iter().any(|field| field.contains(needle))
    }
}

/// Filters and pagination for the transaction listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionQuery {
    /// Restrict to one date; all dates when absent
    pub date: Option<NaiveDate>,
    /// Exact status filter, case-insensitive; `"todos"` or empty means no
    /// filter
    pub status: Option<String>,
    /// Substring searched in every field
    pub search: Option<String>,
    /// 1-indexed page; values below 1 are treated as 1
    pub page: usize,
    pub page_size: usize,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            date: None,
            status: None,
            search: None,
            page: 1,
            page_size: 50,
        }
    }
}

/// One page of matching transactions plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub items: Vec<TransactionRecord>,
    /// Count of all records matching the filters, not just this page
    pub total: usize,
}

impl<S: ReconciliationStorage + Clone> crate::reconciliation::ReconciliationService<S> {
    /// List transactions with optional date/status/search filters, paginated
    pub async fn list_transactions(&self, query: &TransactionQuery) -> ReconResult<TransactionPage> {
        let payments = match query.date {
            Some(date) => self.storage.get_payments(date).await?,
            None => {
                let mut all = Vec::new();
                for date in self.storage.payment_dates().await? {
                    all.extend(self.storage.get_payments(date).await?);
                }
                all
            }
        };

        let status_filter = query
            .status
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty() && s != "todos");
        let search = query
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        let matching: Vec<TransactionRecord> = payments
            .iter()
            .map(TransactionRecord::from_payment)
            .filter(|record| {
                if let Some(ref status) = status_filter {
                    if record.status.as_str() != status {
                        return false;
                    }
                }
                if let Some(ref needle) = search {
                    if !record.matches_search(needle) {
                        return false;
                    }
                }
                true
            })
            .collect();

        let total = matching.len();
        let page = query.page.max(1);
        let items = matching
            .into_iter()
            .skip((page - 1) * query.page_size)
            .take(query.page_size)
            .collect();

        Ok(TransactionPage { items, total })
    }
}
