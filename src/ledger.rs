use hourglass_rs::SafeTimeProvider;

use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::events::{BillingEvent, EventStore};
use crate::invoice::{Invoice, InvoiceBuilder};
use crate::lifecycle;
use crate::numbering::InvoiceNumberGenerator;
use crate::payments::{PaymentProcessor, PaymentRequest};
use crate::store::{InvoiceFilter, InvoiceStore};
use crate::types::{InvoiceId, InvoiceStatus, Payment};

/// owns invoice lifecycle state on top of an invoice store
///
/// every mutation is a load, a pure transform and a versioned commit, so a
/// failed call leaves the store untouched
pub struct InvoiceLedger<S: InvoiceStore> {
    store: S,
    numbers: InvoiceNumberGenerator,
    processor: PaymentProcessor,
    events: EventStore,
}

impl<S: InvoiceStore> InvoiceLedger<S> {
    pub fn new(store: S, config: &BillingConfig) -> Self {
        Self {
            store,
            numbers: InvoiceNumberGenerator::new(config.invoice_numbering.clone()),
            processor: PaymentProcessor::new(),
            events: EventStore::new(),
        }
    }

    /// use a specific number generator, e.g. one resumed from storage
    pub fn with_number_generator(mut self, numbers: InvoiceNumberGenerator) -> Self {
        self.numbers = numbers;
        self
    }

    /// build and record a draft invoice under a fresh invoice number
    pub fn create(
        &mut self,
        builder: &InvoiceBuilder,
        time_provider: &SafeTimeProvider,
    ) -> Result<Invoice> {
        builder.validate()?;
        let now = time_provider.now();

        let mut last_number = String::new();
        for attempt in 0..self.numbers.max_attempts() {
            let number = self.numbers.next_candidate(now, attempt);
            if self.store.contains_number(&number)? {
                tracing::warn!(number = %number, attempt, "invoice number taken, retrying");
                last_number = number;
                continue;
            }

            let invoice = builder.build_at(number.clone(), now)?;
            match self.store.insert(&invoice) {
                Ok(()) => {
                    tracing::info!(
                        invoice = %invoice.invoice_number,
                        patient = %invoice.patient_id,
                        total = %invoice.total_amount,
                        lines = invoice.items.len(),
                        "invoice created"
                    );
                    self.events.emit(BillingEvent::InvoiceCreated {
                        invoice_id: invoice.id,
                        invoice_number: invoice.invoice_number.clone(),
                        patient_id: invoice.patient_id.clone(),
                        total_amount: invoice.total_amount,
                        timestamp: now,
                    });
                    return Ok(invoice);
                }
                Err(BillingError::DuplicateInvoiceNumber { number }) => {
                    tracing::warn!(number = %number, attempt, "invoice number collided on insert, retrying");
                    last_number = number;
                }
                Err(err) => return Err(err),
            }
        }

        Err(BillingError::DuplicateInvoiceNumber {
            number: last_number,
        })
    }

    /// draft -> sent
    pub fn send(&mut self, id: InvoiceId, time_provider: &SafeTimeProvider) -> Result<Invoice> {
        let stored = self.store.load(id)?;
        let now = time_provider.now();
        let sent = lifecycle::send(&stored.invoice, now)?;
        self.store.commit(&sent, stored.version, None)?;

        tracing::info!(invoice = %sent.invoice_number, due = %sent.due_date, "invoice sent");
        self.events.emit(BillingEvent::InvoiceSent {
            invoice_id: id,
            timestamp: now,
        });
        if sent.status == InvoiceStatus::Paid {
            tracing::info!(invoice = %sent.invoice_number, "nothing owed, invoice settled on send");
            self.events.emit(BillingEvent::InvoicePaid {
                invoice_id: id,
                total_paid: sent.amount_paid,
                timestamp: now,
            });
        }
        Ok(sent)
    }

    /// draft|sent -> cancelled
    pub fn cancel(&mut self, id: InvoiceId, time_provider: &SafeTimeProvider) -> Result<Invoice> {
        let stored = self.store.load(id)?;
        let now = time_provider.now();
        let cancelled = lifecycle::cancel(&stored.invoice, now)?;
        self.store.commit(&cancelled, stored.version, None)?;

        tracing::info!(invoice = %cancelled.invoice_number, "invoice cancelled");
        self.events.emit(BillingEvent::InvoiceCancelled {
            invoice_id: id,
            balance_due: cancelled.balance_due,
            timestamp: now,
        });
        Ok(cancelled)
    }

    /// apply a payment and record it in the payment log
    pub fn apply_payment(
        &mut self,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Invoice> {
        let stored = self.store.load(request.invoice_id)?;
        let outcome = self.processor.apply(&stored.invoice, request, time_provider)?;
        self.store
            .commit(&outcome.invoice, stored.version, Some(&outcome.payment))?;

        let now = time_provider.now();
        let invoice = outcome.invoice;
        self.events.emit(BillingEvent::PaymentApplied {
            invoice_id: invoice.id,
            payment_id: outcome.payment.id,
            amount: outcome.payment.amount,
            method: outcome.payment.method,
            balance_due: invoice.balance_due,
            timestamp: now,
        });
        if invoice.status == InvoiceStatus::Paid {
            tracing::info!(invoice = %invoice.invoice_number, "invoice paid in full");
            self.events.emit(BillingEvent::InvoicePaid {
                invoice_id: invoice.id,
                total_paid: invoice.amount_paid,
                timestamp: now,
            });
        }
        Ok(invoice)
    }

    pub fn get(&self, id: InvoiceId) -> Result<Invoice> {
        Ok(self.store.load(id)?.invoice)
    }

    pub fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        self.store.list(filter)
    }

    pub fn payments(&self, id: InvoiceId) -> Result<Vec<Payment>> {
        self.store.payments(id)
    }

    /// sum of the payment log for an invoice
    pub fn total_payments(&self, id: InvoiceId) -> Result<Money> {
        Ok(self.payments(id)?.iter().map(|p| p.amount).sum())
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BillingEvent> {
        self.events.take_events()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
