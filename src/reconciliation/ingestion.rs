//! Ingestion of parsed payment files into the payment store
//!
//! The external layer parses CSV/XLSX uploads into [`TabularData`]; this
//! module validates the declared schema, converts rows into [`Payment`]
//! records, and records expected amounts as a side effect of credit card
//! ingestion. Row conversion is best effort: a malformed row is skipped with
//! a warning, only the batch as a whole is strict (schema shape, at least
//! one survivor).

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Columns a credit card sales file must declare
pub const REQUIRED_CREDIT_CARD_COLUMNS: [&str; 5] = [
    "order_id",
    "payment_sequential",
    "payment_type",
    "payment_installments",
    "payment_value",
];

/// Length of the ticket prefix taken from the order id
const TICKET_PREFIX_LEN: usize = 8;

/// One parsed row of named string cells
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell value (builder style)
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.values.insert(column.to_string(), value.to_string());
        self
    }

    /// Get a cell value, if the row has one for the column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A parsed tabular file: declared columns plus rows of named cells
///
/// Produced by the external CSV/XLSX layer; the core never touches files.
#[derive(Debug, Clone, Default)]
pub struct TabularData {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl TabularData {
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: RawRow) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Required columns the file does not declare
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|col| !self.columns.iter().any(|c| c == *col))
            .map(|col| col.to_string())
            .collect()
    }
}

/// Why a row was skipped during ingestion
///
/// Skips are logged, never raised; they exist so the fold over rows stays
/// explicit instead of relying on control-flow shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `payment_type` was not `credit_card`
    WrongPaymentType(String),
    /// `payment_value` unparsable or not strictly positive
    InvalidAmount(String),
    /// `payment_installments` unparsable or not strictly positive
    InvalidInstallments(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WrongPaymentType(value) => {
                write!(f, "invalid payment type '{}'", value)
            }
            SkipReason::InvalidAmount(value) => {
                write!(f, "invalid payment value '{}'", value)
            }
            SkipReason::InvalidInstallments(value) => {
                write!(f, "invalid installments '{}'", value)
            }
        }
    }
}

/// Ingestion manager converting tabular rows into stored payments
pub struct IngestionManager<S: ReconciliationStorage> {
    pub(crate) storage: S,
    detector: Box<dyn BrandDetector>,
}

impl<S: ReconciliationStorage> IngestionManager<S> {
    /// Create a new ingestion manager with the default brand detector
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            detector: Box::new(FirstDigitBrandDetector),
        }
    }

    /// Create a new ingestion manager with a custom brand detector
    pub fn with_detector(storage: S, detector: Box<dyn BrandDetector>) -> Self {
        Self { storage, detector }
    }

    /// Ingest a credit card sales file for the given attribution date
    ///
    /// The date is an explicit parameter: the core never stamps "now" on a
    /// payment. Fails with `MissingColumns` when the schema is wrong and
    /// `NoValidRecords` when every row was skipped; in both cases nothing is
    /// persisted. With at least one survivor the batch is persisted even if
    /// other rows were skipped. Expected amounts are recorded first
    /// occurrence wins per ticket within the call.
    pub async fn ingest_credit_card(
        &mut self,
        data: &TabularData,
        date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        let missing = data.missing_columns(&REQUIRED_CREDIT_CARD_COLUMNS);
        if !missing.is_empty() {
            return Err(ReconciliationError::MissingColumns(missing));
        }

        let batch = Uuid::new_v4();
        info!(%batch, %date, rows = data.rows().len(), "processing credit card file");

        let mut payments = Vec::new();
        let mut expected = ExpectedAmounts::new();

        for (idx, row) in data.rows().iter().enumerate() {
            // 1-based file line, counting the header as line 1
            let line = idx + 2;
            match self.convert_credit_card_row(row, date) {
                Ok(payment) => {
                    expected
                        .entry(payment.ticket_number.clone())
                        .or_insert_with(|| payment.amount.clone());
                    payments.push(payment);
                }
                Err(reason) => {
                    warn!(%batch, line, %reason, "skipping row");
                }
            }
        }

        if payments.is_empty() {
            return Err(ReconciliationError::NoValidRecords);
        }

        self.storage.append_payments(date, &payments).await?;
        self.storage.merge_expected(date, expected).await?;

        info!(%batch, processed = payments.len(), "credit card file processed");
        Ok(payments)
    }

    /// Ingest a CNAB bank file for boleto settlements
    ///
    /// Reserved ingestion point: CNAB record layouts vary per bank and no
    /// parser has landed yet, so this returns no payments and leaves the
    /// stores untouched.
    pub async fn ingest_cnab(
        &mut self,
        _data: &TabularData,
        _date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        Ok(Vec::new())
    }

    /// Ingest a PIX statement file
    ///
    /// Reserved ingestion point, same contract as [`ingest_cnab`].
    ///
    /// [`ingest_cnab`]: IngestionManager::ingest_cnab
    pub async fn ingest_pix(
        &mut self,
        _data: &TabularData,
        _date: NaiveDate,
    ) -> ReconResult<Vec<Payment>> {
        Ok(Vec::new())
    }

    fn convert_credit_card_row(
        &self,
        row: &RawRow,
        date: NaiveDate,
    ) -> Result<Payment, SkipReason> {
        let payment_type = row.get("payment_type").unwrap_or_default().trim();
        if !payment_type.eq_ignore_ascii_case("credit_card") {
            return Err(SkipReason::WrongPaymentType(payment_type.to_string()));
        }

        let raw_value = row.get("payment_value").unwrap_or_default().trim();
        let amount = BigDecimal::from_str(raw_value)
            .map_err(|_| SkipReason::InvalidAmount(raw_value.to_string()))?;
        if amount <= BigDecimal::from(0) {
            return Err(SkipReason::InvalidAmount(raw_value.to_string()));
        }

        let raw_installments = row.get("payment_installments").unwrap_or_default().trim();
        let installments = raw_installments
            .parse::<i64>()
            .map_err(|_| SkipReason::InvalidInstallments(raw_installments.to_string()))?;
        if installments <= 0 {
            return Err(SkipReason::InvalidInstallments(raw_installments.to_string()));
        }

        let order_id = row.get("order_id").unwrap_or_default().trim();
        let ticket_number: String = order_id.chars().take(TICKET_PREFIX_LEN).collect();
        let method = self.detector.detect(order_id);

        Payment::new(
            ticket_number,
            amount,
            PaymentChannel::CreditCard,
            method,
            installments as u32,
            order_id.to_string(),
            date,
        )
        .map_err(|_| SkipReason::InvalidAmount(raw_value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn card_row(order_id: &str, value: &str, installments: &str) -> RawRow {
        RawRow::new()
            .with("order_id", order_id)
            .with("payment_sequential", "1")
            .with("payment_type", "credit_card")
            .with("payment_installments", installments)
            .with("payment_value", value)
    }

    fn card_file(rows: Vec<RawRow>) -> TabularData {
        let mut data = TabularData::new(REQUIRED_CREDIT_CARD_COLUMNS);
        for row in rows {
            data.push_row(row);
        }
        data
    }

    #[tokio::test]
    async fn missing_column_fails_with_schema_error() {
        let mut manager = IngestionManager::new(MemoryStorage::new());
        let data = TabularData::new([
            "order_id",
            "payment_sequential",
            "payment_type",
            "payment_value",
        ]);

        let err = manager.ingest_credit_card(&data, date()).await.unwrap_err();
        match err {
            ReconciliationError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["payment_installments".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn negative_value_row_is_skipped_not_fatal() {
        let storage = MemoryStorage::new();
        let mut manager = IngestionManager::new(storage.clone());
        let data = card_file(vec![
            card_row("1a2b3c4d5e", "-5", "1"),
            card_row("2f3g4h5i6j", "50", "1"),
        ]);

        let payments = manager.ingest_credit_card(&data, date()).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, BigDecimal::from(50));

        let stored = storage.get_payments(date()).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn all_rows_invalid_fails_without_persisting() {
        let storage = MemoryStorage::new();
        let mut manager = IngestionManager::new(storage.clone());
        let data = card_file(vec![
            card_row("1a2b3c4d", "abc", "1"),
            card_row("2f3g4h5i", "50", "0"),
            RawRow::new()
                .with("order_id", "3a3a3a3a")
                .with("payment_sequential", "1")
                .with("payment_type", "voucher")
                .with("payment_installments", "1")
                .with("payment_value", "10"),
        ]);

        let err = manager.ingest_credit_card(&data, date()).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::NoValidRecords));
        assert!(storage.get_payments(date()).await.unwrap().is_empty());
        assert!(storage.get_expected(date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ticket_is_first_eight_chars_of_order_id() {
        let mut manager = IngestionManager::new(MemoryStorage::new());
        let data = card_file(vec![card_row("1a2b3c4d5e6f", "75.50", "3")]);

        let payments = manager.ingest_credit_card(&data, date()).await.unwrap();
        assert_eq!(payments[0].ticket_number, "1a2b3c4d");
        assert_eq!(payments[0].transaction_id, "1a2b3c4d5e6f");
        assert_eq!(payments[0].installments, 3);
    }

    #[tokio::test]
    async fn brand_follows_first_digit_parity() {
        let mut manager = IngestionManager::new(MemoryStorage::new());
        let data = card_file(vec![
            card_row("1aaaaaaa", "10", "1"),
            card_row("2bbbbbbb", "10", "1"),
            card_row("zccccccc", "10", "1"),
        ]);

        let payments = manager.ingest_credit_card(&data, date()).await.unwrap();
        assert_eq!(payments[0].method, PaymentMethod::Mastercard);
        assert_eq!(payments[1].method, PaymentMethod::Visa);
        assert_eq!(payments[2].method, PaymentMethod::Mastercard);
    }

    #[tokio::test]
    async fn expected_amount_is_first_occurrence_per_ticket() {
        let storage = MemoryStorage::new();
        let mut manager = IngestionManager::new(storage.clone());
        // Same ticket prefix, different amounts: the first one wins
        let data = card_file(vec![
            card_row("1a2b3c4d-one", "100", "1"),
            card_row("1a2b3c4d-two", "40", "1"),
        ]);

        manager.ingest_credit_card(&data, date()).await.unwrap();

        let expected = storage.get_expected(date()).await.unwrap();
        assert_eq!(expected["1a2b3c4d"], BigDecimal::from(100));
    }

    #[tokio::test]
    async fn payment_type_check_is_case_insensitive() {
        let mut manager = IngestionManager::new(MemoryStorage::new());
        let data = card_file(vec![RawRow::new()
            .with("order_id", "1a2b3c4d")
            .with("payment_sequential", "1")
            .with("payment_type", "Credit_Card")
            .with("payment_installments", "1")
            .with("payment_value", "10")]);

        let payments = manager.ingest_credit_card(&data, date()).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn cnab_and_pix_are_reserved_and_empty() {
        let storage = MemoryStorage::new();
        let mut manager = IngestionManager::new(storage.clone());
        let data = TabularData::new(["anything"]);

        assert!(manager.ingest_cnab(&data, date()).await.unwrap().is_empty());
        assert!(manager.ingest_pix(&data, date()).await.unwrap().is_empty());
        assert!(storage.get_payments(date()).await.unwrap().is_empty());
    }
}
