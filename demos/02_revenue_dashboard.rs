/// revenue dashboard - collection rate, trailing revenue, top services
use chrono::{Duration, TimeZone, Utc};
use clinic_billing::{
    BillingConfig, BillingEngine, CurrencyFormat, InvoiceFilter, MemoryInvoiceStore, Money,
    PatientRecord, PatientRegistry, PaymentMethod, Rate, SafeTimeProvider, ServiceCatalog,
    ServiceCategory, ServiceCode, ServiceLine, TimeSource,
};
use clinic_billing::reports::RevenueAnalytics;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== revenue dashboard ===\n");

    let mut catalog = ServiceCatalog::new();
    for (code, description, category, price) in [
        ("99213", "Office visit, established", ServiceCategory::Consultation, 85),
        ("97110", "Therapeutic exercise", ServiceCategory::Therapy, 40),
        ("90471", "Immunization admin", ServiceCategory::Procedure, 25),
    ] {
        catalog.insert(ServiceCode {
            code: code.to_string(),
            description: description.to_string(),
            category,
            base_price: Money::from_major(price),
            insurance_coverage_percent: Rate::ZERO,
            duration_minutes: 15,
        })?;
    }

    let mut patients = PatientRegistry::new();
    for id in ["PAT-010", "PAT-011", "PAT-012"] {
        patients.upsert(PatientRecord {
            id: id.to_string(),
            name: format!("patient {}", id),
            insurance: None,
        })?;
    }

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
    ));
    let mut engine = BillingEngine::new(
        BillingConfig::standard(),
        catalog,
        patients,
        MemoryInvoiceStore::new(),
        time,
    )?
    .with_currency_format(CurrencyFormat::de_de());

    // a quarter of visits, some paid, some partially
    for week in 0..12u32 {
        let patient = ["PAT-010", "PAT-011", "PAT-012"][(week % 3) as usize];
        let mut lines = vec![ServiceLine::new("99213", 1)];
        if week % 2 == 0 {
            lines.push(ServiceLine::new("97110", 2));
        }
        if week % 4 == 0 {
            lines.push(ServiceLine::new("90471", 1));
        }
        let visit_day = engine.today();
        let invoice = engine.build_invoice(patient, visit_day, &lines)?;
        engine.send_invoice(invoice.id)?;

        match week % 3 {
            0 => {
                engine.apply_payment(invoice.id, invoice.total_amount, PaymentMethod::DebitCard, None)?;
            }
            1 => {
                engine.apply_payment(invoice.id, Money::from_major(50), PaymentMethod::Cash, None)?;
            }
            _ => {}
        }
        engine.time().test_control().unwrap().advance(Duration::days(7));
    }

    let invoices = engine.list_invoices(&InvoiceFilter::all())?;
    let analytics = RevenueAnalytics::new();
    let fmt = CurrencyFormat::de_de();

    println!("collection rate:      {}", engine.get_collection_rate(&invoices));
    println!("billed, last 30 days: {}", fmt.format(engine.revenue_by_period(Duration::days(30))?));
    println!("outstanding:          {}", fmt.format(analytics.outstanding_total(&invoices)));

    println!("\nby month:");
    for ((year, month), total) in analytics.revenue_by_month(&invoices) {
        println!("  {}-{:02}  {}", year, month, fmt.format(total));
    }

    println!("\ntop services:");
    for service in engine.top_services(3)? {
        println!(
            "  {:<6} {:<28} x{:<3} {}",
            service.service_code,
            service.description,
            service.quantity,
            fmt.format(service.revenue)
        );
    }

    Ok(())
}
