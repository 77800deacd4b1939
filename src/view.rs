//! serializable invoice view for UI and reporting consumers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::format::CurrencyFormat;
use crate::invoice::Invoice;
use crate::lifecycle;
use crate::types::{DisplayStatus, InvoiceId};

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: String,
    pub status: DisplayStatus,
    pub date_of_service: NaiveDate,
    pub created_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub lines: Vec<LineView>,
    pub amounts: AmountsView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineView {
    pub service_code: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: String,
    pub total_price: String,
    pub insurance_covered: String,
    pub patient_responsible: String,
    pub copay: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AmountsView {
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    pub paid: String,
    pub balance_due: String,
    pub insurance_responsibility: String,
    pub patient_responsibility: String,
}

impl InvoiceView {
    pub fn from_invoice(invoice: &Invoice, today: NaiveDate, format: &CurrencyFormat) -> Self {
        let days_overdue = if lifecycle::is_overdue(invoice, today) {
            lifecycle::days_overdue(invoice, today)
        } else {
            0
        };

        InvoiceView {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            patient_id: invoice.patient_id.clone(),
            status: lifecycle::display_status(invoice, today),
            date_of_service: invoice.date_of_service,
            created_date: invoice.created_date,
            due_date: invoice.due_date,
            days_overdue,
            lines: invoice
                .items
                .iter()
                .map(|item| LineView {
                    service_code: item.service_code.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: format.format(item.unit_price),
                    total_price: format.format(item.total_price),
                    insurance_covered: format.format(item.insurance_covered),
                    patient_responsible: format.format(item.patient_responsible),
                    copay: format.format(item.copay),
                })
                .collect(),
            amounts: AmountsView {
                subtotal: format.format(invoice.subtotal),
                tax: format.format(invoice.tax_amount),
                discount: format.format(invoice.discount_amount),
                total: format.format(invoice.total_amount),
                paid: format.format(invoice.amount_paid),
                balance_due: format.format(invoice.balance_due),
                insurance_responsibility: format.format(invoice.insurance_total()),
                patient_responsibility: format.format(invoice.patient_total()),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
