use chrono::{DateTime, Duration, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{BillingConfig, DeductibleApplication};
use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};
use crate::reference::{InsuranceProfile, ServiceCode};
use crate::reimbursement::{AllocationInput, ReimbursementCalculator};
use crate::types::{InvoiceId, InvoiceStatus, PatientId};

/// one billed service on an invoice, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingLineItem {
    pub id: Uuid,
    pub service_code: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    pub insurance_covered: Money,
    /// total_price - insurance_covered
    pub patient_responsible: Money,
    /// copay charged with this line, owed by the patient on top of total_price
    pub copay: Money,
    pub deductible_applied: Money,
}

/// invoice aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub date_of_service: NaiveDate,
    pub created_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub items: Vec<BillingLineItem>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub balance_due: Money,
    pub last_status_change: DateTime<Utc>,
}

impl Invoice {
    /// amount expected from the insurer across all lines
    pub fn insurance_total(&self) -> Money {
        self.items.iter().map(|item| item.insurance_covered).sum()
    }

    /// amount owed by the patient across all lines, copays included
    pub fn patient_total(&self) -> Money {
        self.items
            .iter()
            .map(|item| item.patient_responsible + item.copay)
            .sum()
    }

    pub fn copay_total(&self) -> Money {
        self.items.iter().map(|item| item.copay).sum()
    }

    /// true while the invoice still accepts payments
    pub fn accepts_payment(&self) -> bool {
        !self.status.is_terminal()
    }

    /// `balance_due == total_amount - amount_paid` and never negative
    pub fn balance_consistent(&self) -> bool {
        self.balance_due == (self.total_amount - self.amount_paid).non_negative()
            && !self.balance_due.is_negative()
    }

    pub(crate) fn update_status(&mut self, status: InvoiceStatus, timestamp: DateTime<Utc>) {
        self.status = status;
        self.last_status_change = timestamp;
    }
}

/// a service to bill, resolved from the catalog or entered directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillableService {
    pub service_code: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub coverage: Rate,
}

impl BillableService {
    /// bill a catalog service at its base price
    pub fn from_catalog(service: &ServiceCode, quantity: u32) -> Self {
        Self {
            service_code: service.code.clone(),
            description: service.description.clone(),
            quantity,
            unit_price: service.base_price,
            coverage: service.insurance_coverage_percent,
        }
    }

    /// override the catalog price for this line
    pub fn with_unit_price(mut self, unit_price: Money) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }

    fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(BillingError::validation(format!(
                "service {} quantity must be at least 1",
                self.service_code
            )));
        }
        if self.unit_price.is_negative() {
            return Err(BillingError::validation(format!(
                "service {} unit price must not be negative",
                self.service_code
            )));
        }
        if !self.coverage.is_valid_percentage() {
            return Err(BillingError::validation(format!(
                "service {} coverage {} outside 0-100",
                self.service_code, self.coverage
            )));
        }
        Ok(())
    }
}

/// assembles line items into a draft invoice
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    config: BillingConfig,
    calculator: ReimbursementCalculator,
    patient_id: Option<PatientId>,
    insurance: Option<InsuranceProfile>,
    date_of_service: Option<NaiveDate>,
    items: Vec<BillableService>,
    tax_amount: Money,
    discount_amount: Money,
}

impl InvoiceBuilder {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            config: config.clone(),
            calculator: ReimbursementCalculator::new(),
            patient_id: None,
            insurance: None,
            date_of_service: None,
            items: Vec::new(),
            tax_amount: Money::ZERO,
            discount_amount: Money::ZERO,
        }
    }

    pub fn patient(mut self, patient_id: impl Into<PatientId>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// coverage snapshot used for every line of this build
    pub fn insurance(mut self, profile: Option<InsuranceProfile>) -> Self {
        self.insurance = profile;
        self
    }

    pub fn date_of_service(mut self, date: NaiveDate) -> Self {
        self.date_of_service = Some(date);
        self
    }

    pub fn item(mut self, service: BillableService) -> Self {
        self.items.push(service);
        self
    }

    pub fn items(mut self, services: impl IntoIterator<Item = BillableService>) -> Self {
        self.items.extend(services);
        self
    }

    /// pass-through, never computed here
    pub fn tax_amount(mut self, amount: Money) -> Self {
        self.tax_amount = amount;
        self
    }

    pub fn discount_amount(mut self, amount: Money) -> Self {
        self.discount_amount = amount;
        self
    }

    /// check inputs without building
    pub fn validate(&self) -> Result<()> {
        match &self.patient_id {
            Some(id) if !id.trim().is_empty() => {}
            _ => return Err(BillingError::validation("patient is required")),
        }
        if self.date_of_service.is_none() {
            return Err(BillingError::validation("date of service is required"));
        }
        if self.items.is_empty() {
            return Err(BillingError::validation("invoice needs at least one line item"));
        }
        for item in &self.items {
            item.validate()?;
        }
        if let Some(profile) = &self.insurance {
            profile.validate()?;
        }
        if self.tax_amount.is_negative() || self.discount_amount.is_negative() {
            return Err(BillingError::validation(
                "tax and discount must not be negative",
            ));
        }
        let gross: Money = self.items.iter().map(BillableService::total_price).sum();
        if self.discount_amount > gross + self.tax_amount {
            return Err(BillingError::validation(format!(
                "discount {} exceeds invoice amount {}",
                self.discount_amount,
                gross + self.tax_amount
            )));
        }
        Ok(())
    }

    /// build with the clock from the time provider
    pub fn build_with_time(
        &self,
        invoice_number: String,
        time_provider: &SafeTimeProvider,
    ) -> Result<Invoice> {
        self.build_at(invoice_number, time_provider.now())
    }

    /// build a draft invoice created at `now`
    pub fn build_at(&self, invoice_number: String, now: DateTime<Utc>) -> Result<Invoice> {
        self.validate()?;

        // validate() guarantees both are present
        let (patient_id, date_of_service) = match (&self.patient_id, self.date_of_service) {
            (Some(patient_id), Some(date)) => (patient_id.clone(), date),
            _ => return Err(BillingError::validation("patient and date of service are required")),
        };

        let items = self.allocate_lines();
        let subtotal: Money = items.iter().map(|item| item.total_price).sum();
        let total_amount = subtotal + self.tax_amount - self.discount_amount;

        Ok(Invoice {
            id: Uuid::new_v4(),
            invoice_number,
            patient_id,
            date_of_service,
            created_date: now,
            due_date: now.date_naive() + Duration::days(self.config.payment_terms_days as i64),
            status: InvoiceStatus::Draft,
            items,
            subtotal,
            tax_amount: self.tax_amount,
            discount_amount: self.discount_amount,
            total_amount,
            amount_paid: Money::ZERO,
            balance_due: total_amount,
            last_status_change: now,
        })
    }

    fn allocate_lines(&self) -> Vec<BillingLineItem> {
        let mut deductible_met = self
            .insurance
            .as_ref()
            .map(|profile| profile.deductible_met)
            .unwrap_or(Money::ZERO);
        let mut copay_charged = false;

        let mut lines = Vec::with_capacity(self.items.len());
        for service in &self.items {
            let total_price = service.total_price();

            let input = match &self.insurance {
                Some(profile) => {
                    let charge_copay = self.config.copay_per_line_item || !copay_charged;
                    AllocationInput {
                        service_price: total_price,
                        coverage: service.coverage,
                        deductible: profile.deductible,
                        deductible_met,
                        copay: if charge_copay { profile.copay } else { Money::ZERO },
                    }
                }
                None => AllocationInput::self_pay(total_price),
            };

            let allocation = self.calculator.allocate(input);
            if !allocation.copay.is_zero() {
                copay_charged = true;
            }
            if self.config.deductible_application == DeductibleApplication::Sequential {
                deductible_met += allocation.deductible_applied;
            }

            lines.push(BillingLineItem {
                id: Uuid::new_v4(),
                service_code: service.service_code.clone(),
                description: service.description.clone(),
                quantity: service.quantity,
                unit_price: service.unit_price,
                total_price,
                insurance_covered: allocation.insurer_pays,
                patient_responsible: total_price - allocation.insurer_pays,
                copay: allocation.copay,
                deductible_applied: allocation.deductible_applied,
            });
        }
        lines
    }
}
