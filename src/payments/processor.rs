use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::errors::Result;
use crate::invoice::Invoice;
use crate::lifecycle;
use crate::types::Payment;

use super::PaymentRequest;

/// invoice snapshot after a payment, with the payment record to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub invoice: Invoice,
    pub payment: Payment,
}

/// applies payments to invoice balances
///
/// pure: the input invoice is never touched, so a rejected payment leaves
/// nothing behind
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentProcessor;

impl PaymentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// apply a payment, returning the updated invoice and the payment record
    pub fn apply(
        &self,
        invoice: &Invoice,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        if let Err(err) = request.validate_against(invoice) {
            tracing::warn!(
                invoice = %invoice.invoice_number,
                amount = %request.amount,
                balance_due = %invoice.balance_due,
                error = %err,
                "payment rejected"
            );
            return Err(err);
        }

        let now = time_provider.now();
        let mut next = invoice.clone();
        next.amount_paid += request.amount;
        next.balance_due = next.total_amount - next.amount_paid;
        lifecycle::settle(&mut next, now)?;

        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id: invoice.id,
            amount: request.amount,
            payment_date: request.payment_date,
            method: request.method,
            transaction_id: request.transaction_id,
        };

        tracing::info!(
            invoice = %next.invoice_number,
            amount = %payment.amount,
            balance_due = %next.balance_due,
            status = ?next.status,
            "payment applied"
        );

        Ok(PaymentOutcome {
            invoice: next,
            payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillingConfig;
    use crate::decimal::{Money, Rate};
    use crate::errors::BillingError;
    use crate::invoice::{BillableService, InvoiceBuilder};
    use crate::types::{InvoiceStatus, PaymentMethod};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()))
    }

    fn sent_invoice(time: &SafeTimeProvider, total: i64) -> Invoice {
        let draft = InvoiceBuilder::new(&BillingConfig::standard())
            .patient("p-1")
            .date_of_service(time.now().date_naive())
            .item(BillableService {
                service_code: "99214".to_string(),
                description: "visit".to_string(),
                quantity: 1,
                unit_price: Money::from_major(total),
                coverage: Rate::ZERO,
            })
            .build_with_time("INV-2024-000001".to_string(), time)
            .unwrap();
        lifecycle::send(&draft, time.now()).unwrap()
    }

    fn request(invoice: &Invoice, amount: Money, time: &SafeTimeProvider) -> PaymentRequest {
        PaymentRequest {
            invoice_id: invoice.id,
            amount,
            method: PaymentMethod::CreditCard,
            transaction_id: Some("txn-1".to_string()),
            payment_date: time.now(),
        }
    }

    #[test]
    fn test_partial_then_paid() {
        let time = time();
        let processor = PaymentProcessor::new();
        let invoice = sent_invoice(&time, 270);

        let first = processor
            .apply(&invoice, request(&invoice, Money::from_major(160), &time), &time)
            .unwrap();
        assert_eq!(first.invoice.status, InvoiceStatus::Partial);
        assert_eq!(first.invoice.balance_due, Money::from_major(110));
        assert_eq!(first.payment.amount, Money::from_major(160));

        let second = processor
            .apply(&first.invoice, request(&first.invoice, Money::from_major(110), &time), &time)
            .unwrap();
        assert_eq!(second.invoice.status, InvoiceStatus::Paid);
        assert_eq!(second.invoice.balance_due, Money::ZERO);
        assert_eq!(second.invoice.amount_paid, Money::from_major(270));
    }

    #[test]
    fn test_overpayment_rejected_without_side_effects() {
        let time = time();
        let invoice = sent_invoice(&time, 110);
        let before = invoice.clone();

        let err = PaymentProcessor::new()
            .apply(&invoice, request(&invoice, Money::from_major(200), &time), &time)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidPayment { .. }));
        assert_eq!(invoice, before);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let time = time();
        let invoice = sent_invoice(&time, 110);
        let err = PaymentProcessor::new()
            .apply(&invoice, request(&invoice, Money::ZERO, &time), &time)
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation { .. }));
    }

    #[test]
    fn test_paid_invoice_is_closed() {
        let time = time();
        let processor = PaymentProcessor::new();
        let invoice = sent_invoice(&time, 50);
        let paid = processor
            .apply(&invoice, request(&invoice, Money::from_major(50), &time), &time)
            .unwrap()
            .invoice;

        let err = processor
            .apply(&paid, request(&paid, Money::from_major(1), &time), &time)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvoiceClosed { status: InvoiceStatus::Paid }));
        assert_eq!(paid.amount_paid, Money::from_major(50));
        assert_eq!(paid.balance_due, Money::ZERO);
    }

    #[test]
    fn test_cancelled_invoice_is_closed() {
        let time = time();
        let invoice = sent_invoice(&time, 50);
        let cancelled = lifecycle::cancel(&invoice, time.now()).unwrap();
        let err = PaymentProcessor::new()
            .apply(&cancelled, request(&cancelled, Money::from_major(10), &time), &time)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvoiceClosed { .. }));
    }

    #[test]
    fn test_payment_against_draft_settles_directly() {
        let time = time();
        let draft = InvoiceBuilder::new(&BillingConfig::standard())
            .patient("p-1")
            .date_of_service(time.now().date_naive())
            .item(BillableService {
                service_code: "99214".to_string(),
                description: "visit".to_string(),
                quantity: 1,
                unit_price: Money::from_major(80),
                coverage: Rate::ZERO,
            })
            .build_with_time("INV-2024-000002".to_string(), &time)
            .unwrap();

        let outcome = PaymentProcessor::new()
            .apply(&draft, request(&draft, Money::from_major(20), &time), &time)
            .unwrap();
        assert_eq!(outcome.invoice.status, InvoiceStatus::Partial);
    }
}
