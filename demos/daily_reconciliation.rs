//! Daily reconciliation workflow example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use recon_core::utils::MemoryStorage;
use recon_core::{
    ExpectedAmounts, RawRow, ReconciliationService, TabularData, TransactionQuery,
    REQUIRED_CREDIT_CARD_COLUMNS,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🅿️  Recon Core - Daily Reconciliation Example\n");

    // Create a new service with in-memory storage
    let storage = MemoryStorage::new();
    let mut service = ReconciliationService::new(storage);
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    // 1. Ingest a credit card sales file (already parsed by the upload layer)
    println!("💳 Ingesting credit card sales file...");
    let mut file = TabularData::new(REQUIRED_CREDIT_CARD_COLUMNS);
    for (order_id, value, installments) in [
        ("1a2b3c4d5e6f7890", "45.00", "1"),
        ("2b3c4d5e6f789012", "120.00", "3"),
        ("3c4d5e6f78901234", "30.50", "1"),
        ("bad-row-00000000", "-10", "1"), // skipped, negative value
    ] {
        file.push_row(
            RawRow::new()
                .with("order_id", order_id)
                .with("payment_sequential", "1")
                .with("payment_type", "credit_card")
                .with("payment_installments", installments)
                .with("payment_value", value),
        );
    }

    let payments = service.ingest_credit_card(&file, date).await?;
    println!("  ✓ Ingested {} payments\n", payments.len());

    // 2. Override the expected amount for one ticket
    println!("🎫 Setting expected amounts...");
    let mut expected = ExpectedAmounts::new();
    expected.insert("1a2b3c4d".to_string(), BigDecimal::from(45));
    expected.insert("2b3c4d5e".to_string(), BigDecimal::from(150));
    expected.insert("3c4d5e6f".to_string(), "30.50".parse::<BigDecimal>()?);
    service.set_expected(date, expected).await?;
    println!("  ✓ Expectations set for 3 tickets\n");

    // 3. Reconcile the date
    println!("⚖️  Reconciling {date}...");
    let report = service.reconcile(date).await?;
    println!(
        "  ✓ {} tickets: {} reconciled, {} pending, {} errors\n",
        report.summary.total_tickets,
        report.summary.reconciled_count,
        report.summary.pending_count,
        report.summary.error_count
    );
    for entry in &report.pending {
        println!(
            "  ⏳ Ticket {} still owes {} (expected {}, received {})",
            entry.ticket, entry.difference, entry.expected, entry.received
        );
    }
    println!();

    // 4. Dashboard view
    println!("📊 Dashboard:");
    let dashboard = service.dashboard(date).await?;
    println!(
        "  Expected {} | Received {} | Difference {}",
        dashboard.expected_amount, dashboard.received_amount, dashboard.difference
    );
    println!(
        "  Mastercard {} ({}%) | Visa {} ({}%)",
        dashboard.payment_methods.mastercard,
        dashboard.payment_methods_percentages.mastercard,
        dashboard.payment_methods.visa,
        dashboard.payment_methods_percentages.visa
    );
    println!();

    // 5. Paginated transaction listing
    println!("📋 Transactions:");
    let page = service
        .list_transactions(&TransactionQuery {
            date: Some(date),
            ..Default::default()
        })
        .await?;
    for record in &page.items {
        println!(
            "  {} | {} | {} | {} | {}",
            record.id, record.date, record.method, record.amount, record.status
        );
    }

    Ok(())
}
