//! persistence seam for invoices and their payment log
//!
//! the in-memory store keeps every invoice with a version counter so that
//! read-modify-write cycles can be committed with an optimistic check

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::{BillingError, Result};
use crate::invoice::Invoice;
use crate::types::{InvoiceId, InvoiceStatus, Payment};

/// invoice together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedInvoice {
    pub invoice: Invoice,
    pub version: u64,
}

/// criteria for listing invoices; empty fields match everything
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub patient_id: Option<String>,
    pub statuses: Option<Vec<InvoiceStatus>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl InvoiceFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[InvoiceStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(patient_id) = &self.patient_id {
            if &invoice.patient_id != patient_id {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&invoice.status) {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if invoice.created_date < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if invoice.created_date > to {
                return false;
            }
        }
        true
    }
}

/// storage for invoices and payments
pub trait InvoiceStore {
    /// store a new invoice at version 1; invoice numbers are unique
    fn insert(&self, invoice: &Invoice) -> Result<()>;

    fn load(&self, id: InvoiceId) -> Result<VersionedInvoice>;

    /// replace an invoice if it is still at `expected_version`, appending
    /// `payment` in the same step; returns the new version
    fn commit(
        &self,
        invoice: &Invoice,
        expected_version: u64,
        payment: Option<&Payment>,
    ) -> Result<u64>;

    /// invoices matching the filter, oldest first
    fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>>;

    fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>>;

    fn contains_number(&self, invoice_number: &str) -> Result<bool>;
}

impl<S: InvoiceStore + ?Sized> InvoiceStore for Arc<S> {
    fn insert(&self, invoice: &Invoice) -> Result<()> {
        (**self).insert(invoice)
    }

    fn load(&self, id: InvoiceId) -> Result<VersionedInvoice> {
        (**self).load(id)
    }

    fn commit(
        &self,
        invoice: &Invoice,
        expected_version: u64,
        payment: Option<&Payment>,
    ) -> Result<u64> {
        (**self).commit(invoice, expected_version, payment)
    }

    fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        (**self).list(filter)
    }

    fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>> {
        (**self).payments(invoice_id)
    }

    fn contains_number(&self, invoice_number: &str) -> Result<bool> {
        (**self).contains_number(invoice_number)
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    invoices: HashMap<InvoiceId, VersionedInvoice>,
    numbers: HashSet<String>,
    payments: HashMap<InvoiceId, Vec<Payment>>,
}

/// in-memory store behind a read-write lock
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    inner: RwLock<StoreInner>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InvoiceStore for MemoryInvoiceStore {
    fn insert(&self, invoice: &Invoice) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.numbers.contains(&invoice.invoice_number) {
            return Err(BillingError::DuplicateInvoiceNumber {
                number: invoice.invoice_number.clone(),
            });
        }
        if inner.invoices.contains_key(&invoice.id) {
            return Err(BillingError::validation(format!(
                "invoice {} already stored",
                invoice.id
            )));
        }

        inner.numbers.insert(invoice.invoice_number.clone());
        inner.invoices.insert(
            invoice.id,
            VersionedInvoice {
                invoice: invoice.clone(),
                version: 1,
            },
        );
        Ok(())
    }

    fn load(&self, id: InvoiceId) -> Result<VersionedInvoice> {
        self.inner
            .read()
            .invoices
            .get(&id)
            .cloned()
            .ok_or(BillingError::InvoiceNotFound { id })
    }

    fn commit(
        &self,
        invoice: &Invoice,
        expected_version: u64,
        payment: Option<&Payment>,
    ) -> Result<u64> {
        let mut inner = self.inner.write();
        let stored = inner
            .invoices
            .get_mut(&invoice.id)
            .ok_or(BillingError::InvoiceNotFound { id: invoice.id })?;

        if stored.version != expected_version {
            return Err(BillingError::ConcurrentModification {
                id: invoice.id,
                expected: expected_version,
                found: stored.version,
            });
        }
        if stored.invoice.invoice_number != invoice.invoice_number {
            return Err(BillingError::validation("invoice number is immutable"));
        }

        stored.invoice = invoice.clone();
        stored.version += 1;
        let version = stored.version;

        if let Some(payment) = payment {
            inner
                .payments
                .entry(invoice.id)
                .or_default()
                .push(payment.clone());
        }
        Ok(version)
    }

    fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let inner = self.inner.read();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .values()
            .filter(|stored| filter.matches(&stored.invoice))
            .map(|stored| stored.invoice.clone())
            .collect();
        invoices.sort_by(|a, b| {
            a.created_date
                .cmp(&b.created_date)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });
        Ok(invoices)
    }

    fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>> {
        let inner = self.inner.read();
        if !inner.invoices.contains_key(&invoice_id) {
            return Err(BillingError::InvoiceNotFound { id: invoice_id });
        }
        Ok(inner.payments.get(&invoice_id).cloned().unwrap_or_default())
    }

    fn contains_number(&self, invoice_number: &str) -> Result<bool> {
        Ok(self.inner.read().numbers.contains(invoice_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillingConfig;
    use crate::decimal::{Money, Rate};
    use crate::invoice::{BillableService, InvoiceBuilder};
    use chrono::TimeZone;

    fn invoice(number: &str, patient: &str) -> Invoice {
        InvoiceBuilder::new(&BillingConfig::standard())
            .patient(patient)
            .date_of_service(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap().date_naive())
            .item(BillableService {
                service_code: "99213".to_string(),
                description: "visit".to_string(),
                quantity: 1,
                unit_price: Money::from_major(85),
                coverage: Rate::ZERO,
            })
            .build_at(number.to_string(), Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_insert_rejects_duplicate_number() {
        let store = MemoryInvoiceStore::new();
        store.insert(&invoice("INV-2024-000001", "p-1")).unwrap();
        let err = store.insert(&invoice("INV-2024-000001", "p-2")).unwrap_err();
        assert!(matches!(err, BillingError::DuplicateInvoiceNumber { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_commit_rejected() {
        let store = MemoryInvoiceStore::new();
        let original = invoice("INV-2024-000001", "p-1");
        store.insert(&original).unwrap();

        let first = store.load(original.id).unwrap();
        let second = store.load(original.id).unwrap();

        let mut update = first.invoice.clone();
        update.amount_paid = Money::from_major(10);
        assert_eq!(store.commit(&update, first.version, None).unwrap(), 2);

        let err = store.commit(&second.invoice, second.version, None).unwrap_err();
        assert!(matches!(
            err,
            BillingError::ConcurrentModification { expected: 1, found: 2, .. }
        ));
        assert_eq!(store.load(original.id).unwrap().invoice.amount_paid, Money::from_major(10));
    }

    #[test]
    fn test_list_filters_by_patient_and_status() {
        let store = Arc::new(MemoryInvoiceStore::new());
        store.insert(&invoice("INV-2024-000001", "p-1")).unwrap();
        store.insert(&invoice("INV-2024-000002", "p-2")).unwrap();

        let p1 = store.list(&InvoiceFilter::for_patient("p-1")).unwrap();
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].invoice_number, "INV-2024-000001");

        let sent = store
            .list(&InvoiceFilter::all().with_statuses(&[InvoiceStatus::Sent]))
            .unwrap();
        assert!(sent.is_empty());
        assert!(store.contains_number("INV-2024-000002").unwrap());
    }

    #[test]
    fn test_load_missing() {
        let store = MemoryInvoiceStore::new();
        assert!(matches!(
            store.load(uuid::Uuid::new_v4()),
            Err(BillingError::InvoiceNotFound { .. })
        ));
    }
}
