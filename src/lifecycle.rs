//! invoice status transitions and the derived overdue predicate

use chrono::{DateTime, NaiveDate, Utc};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::invoice::Invoice;
use crate::types::{DisplayStatus, InvoiceStatus};

/// whether `from -> to` is a legal stored transition
pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    use InvoiceStatus::*;
    matches!(
        (from, to),
        (Draft, Sent)
            | (Draft, Cancelled)
            | (Sent, Cancelled)
            | (Draft, Partial)
            | (Sent, Partial)
            | (Partial, Partial)
            | (Draft, Paid)
            | (Sent, Paid)
            | (Partial, Paid)
    )
}

fn check_transition(invoice: &Invoice, to: InvoiceStatus) -> Result<()> {
    if invoice.status.is_terminal() {
        return Err(BillingError::InvoiceClosed {
            status: invoice.status,
        });
    }
    if !can_transition(invoice.status, to) {
        return Err(BillingError::InvalidTransition {
            from: invoice.status,
            to,
        });
    }
    Ok(())
}

/// draft -> sent; balances untouched
///
/// an invoice with nothing owed is already settled and goes straight to paid
pub fn send(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
    check_transition(invoice, InvoiceStatus::Sent)?;
    let mut next = invoice.clone();
    if next.amount_paid >= next.total_amount {
        next.balance_due = Money::ZERO;
        next.update_status(InvoiceStatus::Paid, now);
    } else {
        next.update_status(InvoiceStatus::Sent, now);
    }
    Ok(next)
}

/// draft|sent -> cancelled; balance frozen as-is
pub fn cancel(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
    check_transition(invoice, InvoiceStatus::Cancelled)?;
    let mut next = invoice.clone();
    next.update_status(InvoiceStatus::Cancelled, now);
    Ok(next)
}

/// status implied by the paid amount after a payment
///
/// recomputes `balance_due` and clamps it to zero once fully paid
pub fn settle(invoice: &mut Invoice, now: DateTime<Utc>) -> Result<()> {
    let target = if invoice.amount_paid >= invoice.total_amount {
        InvoiceStatus::Paid
    } else if invoice.amount_paid.is_positive() {
        InvoiceStatus::Partial
    } else {
        return Ok(());
    };

    check_transition(invoice, target)?;
    invoice.balance_due = (invoice.total_amount - invoice.amount_paid).non_negative();
    if invoice.status != target {
        invoice.update_status(target, now);
    }
    Ok(())
}

/// sent or partially paid, something still owed, and past the due date
pub fn is_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
    matches!(invoice.status, InvoiceStatus::Sent | InvoiceStatus::Partial)
        && invoice.balance_due.is_positive()
        && today > invoice.due_date
}

/// whole days past the due date, zero when not yet due
pub fn days_overdue(invoice: &Invoice, as_of: NaiveDate) -> i64 {
    (as_of - invoice.due_date).num_days().max(0)
}

/// status for display, with overdue folded in
pub fn display_status(invoice: &Invoice, today: NaiveDate) -> DisplayStatus {
    if is_overdue(invoice, today) {
        DisplayStatus::Overdue
    } else {
        invoice.status.into()
    }
}
