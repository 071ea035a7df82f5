//! Multi-date history rollups and period-to-period comparison

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::reports::dashboard::MethodBreakdown;
use crate::traits::ReconciliationStorage;
use crate::types::*;

/// Granularity of the history view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Daily,
    Monthly,
    Yearly,
}

impl ViewType {
    /// Characters of the ISO date key that identify a group at this
    /// granularity (`YYYY-MM-DD`, `YYYY-MM`, `YYYY`)
    fn key_len(&self) -> usize {
        match self {
            ViewType::Daily => 10,
            ViewType::Monthly => 7,
            ViewType::Yearly => 4,
        }
    }
}

impl FromStr for ViewType {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(ViewType::Daily),
            "monthly" => Ok(ViewType::Monthly),
            "yearly" => Ok(ViewType::Yearly),
            other => Err(ReconciliationError::Validation(format!(
                "Invalid view type '{}', expected daily, monthly or yearly",
                other
            ))),
        }
    }
}

/// Filters for the history view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Filter received amounts and counts to one method; expected totals
    /// stay unfiltered because expectations carry no method
    pub method: Option<PaymentMethod>,
    pub view: ViewType,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            method: None,
            view: ViewType::Daily,
        }
    }
}

/// Aggregate for one period (a date, month or year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` depending on the view
    pub period: String,
    pub expected_amount: BigDecimal,
    pub received_amount: BigDecimal,
    /// Received minus expected
    pub difference: BigDecimal,
    /// Zero difference reconciles; owing is pending; surplus is an error
    pub status: PaymentStatus,
    pub payment_methods: MethodBreakdown,
    pub transaction_count: usize,
}

/// History items plus their count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryView {
    pub items: Vec<HistoryItem>,
    pub total: usize,
}

/// Inclusive date range for period comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReconResult<Self> {
        if start > end {
            return Err(ReconciliationError::Validation(format!(
                "Period start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Totals over one comparison period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub expected_amount: BigDecimal,
    pub received_amount: BigDecimal,
    pub difference: BigDecimal,
    pub transaction_count: usize,
}

/// Deltas between the two compared periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub expected_diff: BigDecimal,
    pub received_diff: BigDecimal,
    pub transaction_count_diff: i64,
    /// Received growth from period 1 to period 2 in percent; zero when
    /// period 1 received nothing (guarded division)
    pub percentage_change: f64,
}

/// Result of comparing two periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    pub period1: PeriodSummary,
    pub period2: PeriodSummary,
    pub comparison: PeriodComparison,
}

/// Classify a summed difference (received minus expected)
pub(crate) fn classify_difference(difference: &BigDecimal) -> PaymentStatus {
    let zero = BigDecimal::from(0);
    if *difference == zero {
        PaymentStatus::Reconciled
    } else if *difference < zero {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Error
    }
}

impl<S: ReconciliationStorage + Clone> crate::reconciliation::ReconciliationService<S> {
    /// Per-period history over all dates with payments
    pub async fn history(&self, query: &HistoryQuery) -> ReconResult<HistoryView> {
        let mut groups: BTreeMap<String, HistoryItem> = BTreeMap::new();

        for date in self.storage.payment_dates().await? {
            if query.start.is_some_and(|start| date < start)
                || query.end.is_some_and(|end| date > end)
            {
                continue;
            }

            let daily = self.day_aggregate(date, query.method).await?;
            let key: String = daily.period.chars().take(query.view.key_len()).collect();

            match groups.get_mut(&key) {
                Some(group) => {
                    group.expected_amount += &daily.expected_amount;
                    group.received_amount += &daily.received_amount;
                    group.payment_methods.merge(&daily.payment_methods);
                    group.transaction_count += daily.transaction_count;
                    group.difference = &group.received_amount - &group.expected_amount;
                    group.status = classify_difference(&group.difference);
                }
                None => {
                    groups.insert(key.clone(), HistoryItem { period: key, ..daily });
                }
            }
        }

        let items: Vec<HistoryItem> = groups.into_values().collect();
        let total = items.len();
        Ok(HistoryView { items, total })
    }

    /// Compare two inclusive date ranges
    pub async fn compare(
        &self,
        period1: PeriodRange,
        period2: PeriodRange,
        method: Option<PaymentMethod>,
    ) -> ReconResult<ComparisonView> {
        let summary1 = self.aggregate_period(period1, method).await?;
        let summary2 = self.aggregate_period(period2, method).await?;

        let percentage_change = if summary1.received_amount == BigDecimal::from(0) {
            0.0
        } else {
            let r1 = summary1.received_amount.to_f64().unwrap_or(0.0);
            let r2 = summary2.received_amount.to_f64().unwrap_or(0.0);
            (r2 / r1 - 1.0) * 100.0
        };

        let comparison = PeriodComparison {
            expected_diff: &summary2.expected_amount - &summary1.expected_amount,
            received_diff: &summary2.received_amount - &summary1.received_amount,
            transaction_count_diff: summary2.transaction_count as i64
                - summary1.transaction_count as i64,
            percentage_change,
        };

        Ok(ComparisonView {
            period1: summary1,
            period2: summary2,
            comparison,
        })
    }

    async fn aggregate_period(
        &self,
        range: PeriodRange,
        method: Option<PaymentMethod>,
    ) -> ReconResult<PeriodSummary> {
        let mut expected_amount = BigDecimal::from(0);
        let mut received_amount = BigDecimal::from(0);
        let mut transaction_count = 0;

        for date in self.storage.payment_dates().await? {
            if !range.contains(date) {
                continue;
            }
            let daily = self.day_aggregate(date, method).await?;
            expected_amount += daily.expected_amount;
            received_amount += daily.received_amount;
            transaction_count += daily.transaction_count;
        }

        let difference = &received_amount - &expected_amount;
        Ok(PeriodSummary {
            expected_amount,
            received_amount,
            difference,
            transaction_count,
        })
    }

    async fn day_aggregate(
        &self,
        date: NaiveDate,
        method: Option<PaymentMethod>,
    ) -> ReconResult<HistoryItem> {
        let payments = self.storage.get_payments(date).await?;
        let expected_map = self.storage.get_expected(date).await?;

        let filtered: Vec<&Payment> = payments
            .iter()
            .filter(|p| method.is_none_or(|m| p.method == m))
            .collect();

        let expected_amount: BigDecimal = expected_map.values().sum();
        let received_amount: BigDecimal = filtered.iter().map(|p| &p.amount).sum();
        let difference = &received_amount - &expected_amount;

        Ok(HistoryItem {
            period: date.to_string(),
            status: classify_difference(&difference),
            payment_methods: MethodBreakdown::from_payments(filtered.iter().copied()),
            transaction_count: filtered.len(),
            expected_amount,
            received_amount,
            difference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::ReconciliationService;
    use crate::utils::memory_storage::MemoryStorage;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(ticket: &str, amount: i64, method: PaymentMethod, date: NaiveDate) -> Payment {
        Payment::new(
            ticket.to_string(),
            BigDecimal::from(amount),
            PaymentChannel::CreditCard,
            method,
            1,
            format!("{ticket}-order"),
            date,
        )
        .unwrap()
    }

    async fn seeded_service(
        days: Vec<(NaiveDate, i64, i64)>,
    ) -> ReconciliationService<MemoryStorage> {
        // (date, expected, received) with a single visa payment per day
        let mut storage = MemoryStorage::new();
        for (i, (date, expected, received)) in days.into_iter().enumerate() {
            let ticket = format!("tk{i}");
            storage
                .append_payments(
                    date,
                    &[payment(&ticket, received, PaymentMethod::Visa, date)],
                )
                .await
                .unwrap();
            let mut map = ExpectedAmounts::new();
            map.insert(ticket, BigDecimal::from(expected));
            storage.replace_expected(date, map).await.unwrap();
        }
        ReconciliationService::new(storage)
    }

    #[test]
    fn view_type_parses_and_rejects() {
        assert_eq!("daily".parse::<ViewType>().unwrap(), ViewType::Daily);
        assert_eq!("Monthly".parse::<ViewType>().unwrap(), ViewType::Monthly);
        assert!("weekly".parse::<ViewType>().is_err());
    }

    #[tokio::test]
    async fn daily_history_lists_each_date() {
        let service = seeded_service(vec![
            (ymd(2024, 3, 10), 100, 100),
            (ymd(2024, 3, 11), 100, 80),
        ])
        .await;

        let view = service.history(&HistoryQuery::default()).await.unwrap();
        assert_eq!(view.total, 2);
        assert_eq!(view.items[0].period, "2024-03-10");
        assert_eq!(view.items[0].status, PaymentStatus::Reconciled);
        assert_eq!(view.items[1].status, PaymentStatus::Pending);
        assert_eq!(view.items[1].difference, BigDecimal::from(-20));
    }

    #[tokio::test]
    async fn monthly_rollup_sums_and_reclassifies() {
        let service = seeded_service(vec![
            (ymd(2024, 3, 10), 100, 100),
            (ymd(2024, 3, 11), 100, 150),
        ])
        .await;

        let view = service
            .history(&HistoryQuery {
                view: ViewType::Monthly,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(view.total, 1);
        let month = &view.items[0];
        assert_eq!(month.period, "2024-03");
        assert_eq!(month.expected_amount, BigDecimal::from(200));
        assert_eq!(month.received_amount, BigDecimal::from(250));
        assert_eq!(month.difference, BigDecimal::from(50));
        assert_eq!(month.status, PaymentStatus::Error);
        assert_eq!(month.transaction_count, 2);
    }

    #[tokio::test]
    async fn yearly_rollup_groups_across_months() {
        let service = seeded_service(vec![
            (ymd(2024, 3, 10), 100, 100),
            (ymd(2024, 4, 10), 50, 50),
            (ymd(2023, 12, 31), 10, 10),
        ])
        .await;

        let view = service
            .history(&HistoryQuery {
                view: ViewType::Yearly,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(view.total, 2);
        assert_eq!(view.items[0].period, "2023");
        assert_eq!(view.items[1].period, "2024");
        assert_eq!(view.items[1].received_amount, BigDecimal::from(150));
    }

    #[tokio::test]
    async fn history_respects_date_range() {
        let service = seeded_service(vec![
            (ymd(2024, 3, 10), 100, 100),
            (ymd(2024, 3, 11), 100, 100),
            (ymd(2024, 3, 12), 100, 100),
        ])
        .await;

        let view = service
            .history(&HistoryQuery {
                start: Some(ymd(2024, 3, 11)),
                end: Some(ymd(2024, 3, 11)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(view.total, 1);
        assert_eq!(view.items[0].period, "2024-03-11");
    }

    #[tokio::test]
    async fn method_filter_narrows_received_but_not_expected() {
        let mut storage = MemoryStorage::new();
        let date = ymd(2024, 3, 10);
        storage
            .append_payments(
                date,
                &[
                    payment("a", 60, PaymentMethod::Visa, date),
                    payment("b", 40, PaymentMethod::Mastercard, date),
                ],
            )
            .await
            .unwrap();
        let mut map = ExpectedAmounts::new();
        map.insert("a".to_string(), BigDecimal::from(60));
        map.insert("b".to_string(), BigDecimal::from(40));
        storage.replace_expected(date, map).await.unwrap();
        let service = ReconciliationService::new(storage);

        let view = service
            .history(&HistoryQuery {
                method: Some(PaymentMethod::Visa),
                ..Default::default()
            })
            .await
            .unwrap();

        let item = &view.items[0];
        assert_eq!(item.received_amount, BigDecimal::from(60));
        assert_eq!(item.expected_amount, BigDecimal::from(100));
        assert_eq!(item.transaction_count, 1);
        assert_eq!(item.payment_methods.mastercard, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn comparison_guards_division_by_zero() {
        // Period 1 has no payments at all
        let service = seeded_service(vec![(ymd(2024, 4, 10), 100, 120)]).await;

        let view = service
            .compare(
                PeriodRange::new(ymd(2024, 3, 1), ymd(2024, 3, 31)).unwrap(),
                PeriodRange::new(ymd(2024, 4, 1), ymd(2024, 4, 30)).unwrap(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(view.period1.received_amount, BigDecimal::from(0));
        assert_eq!(view.comparison.percentage_change, 0.0);
        assert_eq!(view.comparison.received_diff, BigDecimal::from(120));
        assert_eq!(view.comparison.transaction_count_diff, 1);
    }

    #[tokio::test]
    async fn comparison_computes_growth() {
        let service = seeded_service(vec![
            (ymd(2024, 3, 10), 100, 100),
            (ymd(2024, 4, 10), 100, 150),
        ])
        .await;

        let view = service
            .compare(
                PeriodRange::new(ymd(2024, 3, 1), ymd(2024, 3, 31)).unwrap(),
                PeriodRange::new(ymd(2024, 4, 1), ymd(2024, 4, 30)).unwrap(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(view.comparison.expected_diff, BigDecimal::from(0));
        assert_eq!(view.comparison.received_diff, BigDecimal::from(50));
        assert!((view.comparison.percentage_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_period_range_is_rejected() {
        let err = PeriodRange::new(ymd(2024, 4, 1), ymd(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, ReconciliationError::Validation(_)));
    }
}
