use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InvoiceId, PaymentId, PaymentMethod};

/// events emitted by the ledger, one per committed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingEvent {
    InvoiceCreated {
        invoice_id: InvoiceId,
        invoice_number: String,
        patient_id: String,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },
    InvoiceSent {
        invoice_id: InvoiceId,
        timestamp: DateTime<Utc>,
    },
    InvoiceCancelled {
        invoice_id: InvoiceId,
        balance_due: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentApplied {
        invoice_id: InvoiceId,
        payment_id: PaymentId,
        amount: Money,
        method: PaymentMethod,
        balance_due: Money,
        timestamp: DateTime<Utc>,
    },
    InvoicePaid {
        invoice_id: InvoiceId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
}

impl BillingEvent {
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            BillingEvent::InvoiceCreated { invoice_id, .. }
            | BillingEvent::InvoiceSent { invoice_id, .. }
            | BillingEvent::InvoiceCancelled { invoice_id, .. }
            | BillingEvent::PaymentApplied { invoice_id, .. }
            | BillingEvent::InvoicePaid { invoice_id, .. } => *invoice_id,
        }
    }
}

/// in-memory event buffer
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<BillingEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: BillingEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<BillingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[BillingEvent] {
        &self.events
    }

    /// events for one invoice in emission order
    pub fn for_invoice(&self, invoice_id: InvoiceId) -> impl Iterator<Item = &BillingEvent> {
        self.events.iter().filter(move |e| e.invoice_id() == invoice_id)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
