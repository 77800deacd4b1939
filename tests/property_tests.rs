//! Property-based tests for billing invariants
//!
//! - Allocation conservation: insurer + patient == price + copay
//! - Deductible bound: applied deductible never exceeds what remains
//! - Balance invariant: balance_due == total - paid, never negative
//! - Aging completeness: bucket sum == open balances

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clinic_billing::{
    AgingReportGenerator, AllocationInput, BillableService, BillingConfig, BillingError,
    InsuranceProfile, Invoice, InvoiceBuilder, InvoiceLedger, InvoiceStatus, MemoryInvoiceStore,
    Money, PaymentMethod, PaymentRequest, Rate, ReimbursementCalculator, SafeTimeProvider,
    TimeSource,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for cent amounts up to $100k
fn money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for coverage percentages with two decimals
fn coverage_strategy() -> impl Strategy<Value = Rate> {
    (0i64..=10_000i64).prop_map(|bp| Rate::from_percentage_decimal(Decimal::new(bp, 2)))
}

fn allocation_strategy() -> impl Strategy<Value = AllocationInput> {
    (
        money_strategy(),
        coverage_strategy(),
        money_strategy(),
        0u32..=100u32,
        (0i64..10_000i64).prop_map(Money::from_minor),
    )
        .prop_map(|(price, coverage, deductible, met_pct, copay)| AllocationInput {
            service_price: price,
            coverage,
            deductible,
            deductible_met: deductible.percentage(Rate::from_percentage(met_pct)),
            copay,
        })
}

fn service(price: Money, coverage: Rate) -> BillableService {
    BillableService {
        service_code: "SVC".to_string(),
        description: "service".to_string(),
        quantity: 1,
        unit_price: price,
        coverage,
    }
}

proptest! {
    #[test]
    fn allocation_conserves_price_plus_copay(input in allocation_strategy()) {
        let a = ReimbursementCalculator::new().allocate(input);
        if input.service_price.is_zero() {
            prop_assert_eq!(a.total(), Money::ZERO);
        } else {
            prop_assert_eq!(a.total(), input.service_price + input.copay);
        }
        prop_assert!(!a.insurer_pays.is_negative());
        prop_assert!(!a.patient_pays.is_negative());
    }

    #[test]
    fn deductible_never_over_applied(input in allocation_strategy()) {
        let a = ReimbursementCalculator::new().allocate(input);
        let remaining = (input.deductible - input.deductible_met).max(Money::ZERO);
        prop_assert!(a.deductible_applied <= remaining);
        prop_assert!(a.deductible_applied <= input.service_price);
    }

    #[test]
    fn line_items_conserve_total_price(
        prices in prop::collection::vec((money_strategy(), coverage_strategy()), 1..6),
        deductible in money_strategy(),
        copay in (0i64..5_000i64).prop_map(Money::from_minor),
    ) {
        let profile = InsuranceProfile {
            provider: "Prop Health".to_string(),
            policy_number: "PH-1".to_string(),
            copay,
            deductible,
            deductible_met: Money::ZERO,
        };
        let invoice = InvoiceBuilder::new(&BillingConfig::standard())
            .patient("p-1")
            .insurance(Some(profile))
            .date_of_service(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .items(prices.into_iter().map(|(p, c)| service(p, c)))
            .build_at("INV-2024-000001".to_string(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .unwrap();

        for item in &invoice.items {
            prop_assert_eq!(item.insurance_covered + item.patient_responsible, item.total_price);
        }
        let subtotal: Money = invoice.items.iter().map(|i| i.total_price).sum();
        prop_assert_eq!(invoice.subtotal, subtotal);
        prop_assert_eq!(invoice.balance_due, invoice.total_amount);
    }

    #[test]
    fn balance_invariant_holds_across_payments(
        total_cents in 100i64..1_000_000i64,
        payments in prop::collection::vec(1i64..500_000i64, 1..8),
    ) {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        ));
        let mut ledger = InvoiceLedger::new(MemoryInvoiceStore::new(), &BillingConfig::standard());
        let builder = InvoiceBuilder::new(&BillingConfig::standard())
            .patient("p-1")
            .date_of_service(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .item(service(Money::from_minor(total_cents), Rate::ZERO));
        let invoice = ledger.create(&builder, &time).unwrap();
        ledger.send(invoice.id, &time).unwrap();

        for cents in payments {
            let before = ledger.get(invoice.id).unwrap();
            let result = ledger.apply_payment(
                PaymentRequest {
                    invoice_id: invoice.id,
                    amount: Money::from_minor(cents),
                    method: PaymentMethod::Cash,
                    transaction_id: None,
                    payment_date: time.now(),
                },
                &time,
            );
            let after = ledger.get(invoice.id).unwrap();

            match result {
                Ok(updated) => {
                    prop_assert_eq!(&updated, &after);
                    prop_assert_eq!(after.amount_paid, before.amount_paid + Money::from_minor(cents));
                }
                Err(BillingError::InvalidPayment { .. }) | Err(BillingError::InvoiceClosed { .. }) => {
                    prop_assert_eq!(&before, &after);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }

            prop_assert_eq!(after.balance_due, after.total_amount - after.amount_paid);
            prop_assert!(!after.balance_due.is_negative());
            if after.status == InvoiceStatus::Paid {
                prop_assert!(after.balance_due.is_zero());
            }
            prop_assert_eq!(ledger.total_payments(invoice.id).unwrap(), after.amount_paid);
        }
    }

    #[test]
    fn aging_buckets_cover_every_open_balance(
        entries in prop::collection::vec((1i64..100_000i64, -30i64..200i64, 0u8..5u8), 0..20),
    ) {
        let as_of = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let invoices: Vec<Invoice> = entries
            .iter()
            .enumerate()
            .map(|(n, (cents, days_past_due, status))| {
                let mut invoice = InvoiceBuilder::new(&BillingConfig::standard())
                    .patient("p-1")
                    .date_of_service(created.date_naive())
                    .item(service(Money::from_minor(*cents), Rate::ZERO))
                    .build_at(format!("INV-2024-{:06}", n + 1), created)
                    .unwrap();
                invoice.due_date = as_of - Duration::days(*days_past_due);
                invoice.status = match status {
                    0 => InvoiceStatus::Draft,
                    1 => InvoiceStatus::Sent,
                    2 => InvoiceStatus::Partial,
                    3 => InvoiceStatus::Paid,
                    _ => InvoiceStatus::Cancelled,
                };
                invoice
            })
            .collect();

        let bucket = AgingReportGenerator::new().age_invoices(&invoices, as_of);
        let open: Money = invoices
            .iter()
            .filter(|i| !i.status.is_terminal())
            .map(|i| i.balance_due)
            .sum();
        prop_assert_eq!(bucket.total, open);
        prop_assert_eq!(bucket.bucket_sum(), open);
    }
}
