/// quick start - bill one visit, send it, collect payment
use chrono::{TimeZone, Utc};
use clinic_billing::{
    BillingConfig, BillingEngine, InsuranceProfile, MemoryInvoiceStore, Money, PatientRecord,
    PatientRegistry, PaymentMethod, Rate, SafeTimeProvider, ServiceCatalog, ServiceCategory,
    ServiceCode, ServiceLine, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== clinic billing quick start ===\n");

    let mut catalog = ServiceCatalog::new();
    catalog.insert(ServiceCode {
        code: "99213".to_string(),
        description: "Office visit, established patient".to_string(),
        category: ServiceCategory::Consultation,
        base_price: Money::from_major(85),
        insurance_coverage_percent: Rate::from_percentage(75),
        duration_minutes: 15,
    })?;

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

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    ));
    let mut engine = BillingEngine::new(
        BillingConfig::standard(),
        catalog,
        patients,
        MemoryInvoiceStore::new(),
        time,
    )?;

    // draft invoice for today's visit
    let today = engine.today();
    let invoice = engine.build_invoice("PAT-001", today, &[ServiceLine::new("99213", 1)])?;
    println!("invoice {} created", invoice.invoice_number);
    println!("  total:              ${}", invoice.total_amount);
    println!("  insurance pays:     ${}", invoice.insurance_total());
    println!("  patient pays:       ${} (incl. ${} copay)", invoice.patient_total(), invoice.copay_total());

    let sent = engine.send_invoice(invoice.id)?;
    println!("\nsent, due {}", sent.due_date);

    // insurer remits its share, patient settles the rest
    let after_era = engine.apply_payment(
        invoice.id,
        invoice.insurance_total(),
        PaymentMethod::Insurance,
        Some("ERA-1001".to_string()),
    )?;
    println!("after insurance: {:?}, balance ${}", after_era.status, after_era.balance_due);

    let paid = engine.apply_payment(invoice.id, after_era.balance_due, PaymentMethod::CreditCard, None)?;
    println!("after patient:   {:?}, balance ${}", paid.status, paid.balance_due);

    println!("\n{}", engine.view(invoice.id)?.to_json()?);

    Ok(())
}
