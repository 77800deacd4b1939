/// payments and aging - partial payments, rejected payments, overdue buckets
use chrono::{Duration, TimeZone, Utc};
use clinic_billing::{
    BillingConfig, BillingEngine, BillingError, InsuranceProfile, InvoiceFilter, InvoiceStatus,
    MemoryInvoiceStore, Money, PatientRecord, PatientRegistry, PaymentMethod, Rate,
    SafeTimeProvider, ServiceCatalog, ServiceCategory, ServiceCode, ServiceLine, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== payments and aging ===\n");

    let mut catalog = ServiceCatalog::new();
    for (code, description, category, price, coverage) in [
        ("99213", "Office visit, established", ServiceCategory::Consultation, 85, 75),
        ("80053", "Comprehensive metabolic panel", ServiceCategory::Laboratory, 185, 80),
        ("71046", "Chest x-ray, 2 views", ServiceCategory::Imaging, 150, 80),
    ] {
        catalog.insert(ServiceCode {
            code: code.to_string(),
            description: description.to_string(),
            category,
            base_price: Money::from_major(price),
            insurance_coverage_percent: Rate::from_percentage(coverage),
            duration_minutes: 20,
        })?;
    }

    let mut patients = PatientRegistry::new();
    patients.upsert(PatientRecord {
        id: "PAT-001".to_string(),
        name: "Maria Lopez".to_string(),
        insurance: Some(InsuranceProfile {
            provider: "Blue Cross".to_string(),
            policy_number: "BC-88120".to_string(),
            copay: Money::from_major(20),
            deductible: Money::from_major(1000),
            deductible_met: Money::from_major(1000),
        }),
    })?;
    patients.upsert(PatientRecord {
        id: "PAT-002".to_string(),
        name: "James Park".to_string(),
        insurance: None,
    })?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    let mut engine = BillingEngine::new(
        BillingConfig::standard(),
        catalog,
        patients,
        MemoryInvoiceStore::new(),
        time,
    )?;

    let today = engine.today();
    let labs = engine.build_invoice(
        "PAT-001",
        today,
        &[ServiceLine::new("99213", 1), ServiceLine::new("80053", 1)],
    )?;
    engine.send_invoice(labs.id)?;
    println!("{} billed ${}", labs.invoice_number, labs.total_amount);

    let partial = engine.apply_payment(labs.id, Money::from_major(160), PaymentMethod::Insurance, None)?;
    println!("  partial payment -> {:?}, balance ${}", partial.status, partial.balance_due);

    // overpayment is rejected and leaves the invoice untouched
    match engine.apply_payment(labs.id, Money::from_major(500), PaymentMethod::Cash, None) {
        Err(BillingError::InvalidPayment { amount, balance_due }) => {
            println!("  rejected ${} against balance ${}", amount, balance_due)
        }
        other => println!("  unexpected: {:?}", other),
    }

    engine.time().test_control().unwrap().advance(Duration::days(10));
    let visit_day = engine.today();
    let xray = engine.build_invoice("PAT-002", visit_day, &[ServiceLine::new("71046", 1)])?;
    engine.send_invoice(xray.id)?;
    println!("{} billed ${} (self-pay)", xray.invoice_number, xray.total_amount);

    // walk the clock forward and watch balances age
    for days in [30, 45, 90] {
        engine.time().test_control().unwrap().advance(Duration::days(days));
        let bucket = engine.aging_report()?;
        println!("\naging as of {}", engine.today());
        println!("  current:  ${}", bucket.current);
        println!("  31-60:    ${}", bucket.days31to60);
        println!("  61-90:    ${}", bucket.days61to90);
        println!("  90+:      ${}", bucket.days90plus);
        println!("  total:    ${}", bucket.total);
    }

    let open = engine.list_invoices(
        &InvoiceFilter::all().with_statuses(&[InvoiceStatus::Sent, InvoiceStatus::Partial]),
    )?;
    println!();
    for invoice in &open {
        let view = engine.view(invoice.id)?;
        println!(
            "{} {:?} {} days overdue, owes {}",
            view.invoice_number, view.status, view.days_overdue, view.amounts.balance_due
        );
    }

    Ok(())
}
