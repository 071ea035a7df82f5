//! Main reconciliation service coordinating ingestion and matching

use chrono::NaiveDate;

use crate::reconciliation::{IngestionManager, ReconciliationEngine, TabularData};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_expected_map;

/// Main reconciliation service that orchestrates all operations
///
/// A host process owns one storage instance per deployment and injects it
/// here; there is no ambient global state. Callers must serialize concurrent
/// ingestion and reconciliation of the same date.
pub struct ReconciliationService<S: ReconciliationStorage> {
    ingestion: IngestionManager<S>,
    engine: ReconciliationEngine<S>,
    pub(crate) storage: S,
}

impl<S: ReconciliationStorage + Clone> ReconciliationService<S> {
    /// Create a new service with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            ingestion: IngestionManager::new(storage.clone()),
            engine: ReconciliationEngine::new(storage.clone()),
            storage,
        }
    }

    /// Create a new service with a custom card brand detector
    pub fn with_brand_detector(storage: S, detector: Box<dyn BrandDetector>) -> Self {
        Self {
            ingestion: IngestionManager::with_detector(storage.clone(), detector),
            engine: ReconciliationEngine::new(storage.clone()),
            storage,
        }
    }

    // Ingestion operations
    /// Ingest a credit card sales file attributed to `date`
    pub async fn ingest_credit_card(
        &mut self,
        data: &TabularData,
        date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        self.ingestion.ingest_credit_card(data, date).await
    }

    /// Ingest a CNAB bank file (reserved, returns no payments)
    pub async fn ingest_cnab(
        &mut self,
        data: &TabularData,
        date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        self.ingestion.ingest_cnab(data, date).await
    }

    /// Ingest a PIX statement file (reserved, returns no payments)
    pub async fn ingest_pix(
        &mut self,
        data: &TabularData,
        date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        self.ingestion.ingest_pix(data, date).await
    }

    // Expectation operations
    /// Replace the expected amounts for a date
    ///
    /// Fails with a validation error when any amount is negative; zero is a
    /// legitimate expectation.
    pub async fn set_expected(
        &mut self,
        date: NaiveDate,
        expected: ExpectedAmounts,
    ) -> ReconResult<()> {
        validate_expected_map(&expected)?;
        self.storage.replace_expected(date, expected).await
    }

    /// Get the expected amounts for a date (empty map if none)
    pub async fn get_expected(&self, date: NaiveDate) -> ReconResult<ExpectedAmounts> {
        self.storage.get_expected(date).await
    }

    // Reconciliation
    /// Reconcile all payments of a date against its expectations
    pub async fn reconcile(&mut self, date: NaiveDate) -> ReconResult<ReconciliationReport> {
        self.engine.reconcile(date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn set_expected_rejects_negative_amounts() {
        let mut service = ReconciliationService::new(MemoryStorage::new());

        let mut expected = ExpectedAmounts::new();
        expected.insert("t1".to_string(), BigDecimal::from(-1));

        let err = service.set_expected(date(), expected).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::Validation(_)));
    }

    #[tokio::test]
    async fn set_expected_replaces_whole_map() {
        let mut service = ReconciliationService::new(MemoryStorage::new());

        let mut first = ExpectedAmounts::new();
        first.insert("t1".to_string(), BigDecimal::from(100));
        first.insert("t2".to_string(), BigDecimal::from(200));
        service.set_expected(date(), first).await.unwrap();

        let mut second = ExpectedAmounts::new();
        second.insert("t3".to_string(), BigDecimal::from(300));
        service.set_expected(date(), second).await.unwrap();

        let stored = service.get_expected(date()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["t3"], BigDecimal::from(300));
    }

    #[tokio::test]
    async fn get_expected_for_unknown_date_is_empty() {
        let service = ReconciliationService::new(MemoryStorage::new());
        assert!(service.get_expected(date()).await.unwrap().is_empty());
    }
}
