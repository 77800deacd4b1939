pub mod processor;

use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::invoice::Invoice;
use crate::types::{InvoiceId, PaymentMethod};

pub use processor::{PaymentOutcome, PaymentProcessor};

/// payment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub payment_date: DateTime<Utc>,
}

impl PaymentRequest {
    /// check the request against the invoice it targets
    ///
    /// closed invoices are rejected before the amount is looked at
    pub fn validate_against(&self, invoice: &Invoice) -> Result<()> {
        if self.invoice_id != invoice.id {
            return Err(BillingError::validation(format!(
                "payment targets invoice {} but was applied to {}",
                self.invoice_id, invoice.id
            )));
        }

        if invoice.status.is_terminal() {
            return Err(BillingError::InvoiceClosed {
                status: invoice.status,
            });
        }

        if !self.amount.is_positive() {
            return Err(BillingError::validation(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }

        if self.amount > invoice.balance_due {
            return Err(BillingError::InvalidPayment {
                amount: self.amount,
                balance_due: invoice.balance_due,
            });
        }

        if let Some(transaction_id) = &self.transaction_id {
            if transaction_id.trim().is_empty() {
                return Err(BillingError::validation("transaction id must not be blank"));
            }
        }

        Ok(())
    }
}
