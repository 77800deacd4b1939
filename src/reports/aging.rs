use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::invoice::Invoice;
use crate::lifecycle;
use crate::types::{AgingBucket, AgingCategory, InvoiceId};

/// one receivable in an aging report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingLine {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub category: AgingCategory,
    pub balance_due: Money,
}

/// buckets open balances by days past due
#[derive(Debug, Clone, Copy, Default)]
pub struct AgingReportGenerator;

impl AgingReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// open invoices with something still owed
    fn qualifies(invoice: &Invoice) -> bool {
        !invoice.status.is_terminal() && invoice.balance_due.is_positive()
    }

    /// bucket totals as of `as_of`
    pub fn age_invoices(&self, invoices: &[Invoice], as_of: NaiveDate) -> AgingBucket {
        let mut bucket = AgingBucket::default();
        for invoice in invoices.iter().filter(|i| Self::qualifies(i)) {
            let days = lifecycle::days_overdue(invoice, as_of);
            bucket.add(AgingCategory::from_days_overdue(days), invoice.balance_due);
        }
        bucket
    }

    /// per-invoice detail, most overdue first
    pub fn aging_detail(&self, invoices: &[Invoice], as_of: NaiveDate) -> Vec<AgingLine> {
        let mut lines: Vec<AgingLine> = invoices
            .iter()
            .filter(|i| Self::qualifies(i))
            .map(|invoice| {
                let days_overdue = lifecycle::days_overdue(invoice, as_of);
                AgingLine {
                    invoice_id: invoice.id,
                    invoice_number: invoice.invoice_number.clone(),
                    patient_id: invoice.patient_id.clone(),
                    due_date: invoice.due_date,
                    days_overdue,
                    category: AgingCategory::from_days_overdue(days_overdue),
                    balance_due: invoice.balance_due,
                }
            })
            .collect();
        lines.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });
        lines
    }

    /// bucket totals per patient
    pub fn age_by_patient(
        &self,
        invoices: &[Invoice],
        as_of: NaiveDate,
    ) -> BTreeMap<String, AgingBucket> {
        let mut by_patient: BTreeMap<String, AgingBucket> = BTreeMap::new();
        for invoice in invoices.iter().filter(|i| Self::qualifies(i)) {
            let days = lifecycle::days_overdue(invoice, as_of);
            by_patient
                .entry(invoice.patient_id.clone())
                .or_default()
                .add(AgingCategory::from_days_overdue(days), invoice.balance_due);
        }
        by_patient
    }
}
