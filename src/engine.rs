use chrono::{Duration, NaiveDate};
use hourglass_rs::{SafeTimeProvider, TimeSource};

use crate::config::BillingConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};
use crate::format::CurrencyFormat;
use crate::invoice::{BillableService, Invoice, InvoiceBuilder};
use crate::ledger::InvoiceLedger;
use crate::lifecycle;
use crate::payments::PaymentRequest;
use crate::reference::{PatientRegistry, ServiceCatalog};
use crate::reports::{AgingReportGenerator, RevenueAnalytics, ServiceRevenue};
use crate::store::{InvoiceFilter, InvoiceStore, MemoryInvoiceStore};
use crate::types::{AgingBucket, InvoiceId, Payment, PaymentMethod};
use crate::view::InvoiceView;

/// a service requested for billing by code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLine {
    pub service_code: String,
    pub quantity: u32,
    /// overrides the catalog base price
    pub unit_price: Option<Money>,
}

impl ServiceLine {
    pub fn new(service_code: impl Into<String>, quantity: u32) -> Self {
        Self {
            service_code: service_code.into(),
            quantity,
            unit_price: None,
        }
    }

    pub fn priced_at(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// billing facade: reference data, ledger and clock in one place
pub struct BillingEngine<S: InvoiceStore = MemoryInvoiceStore> {
    config: BillingConfig,
    catalog: ServiceCatalog,
    patients: PatientRegistry,
    ledger: InvoiceLedger<S>,
    time: SafeTimeProvider,
    currency: CurrencyFormat,
    aging: AgingReportGenerator,
    analytics: RevenueAnalytics,
}

impl BillingEngine<MemoryInvoiceStore> {
    /// in-memory engine on the system clock
    pub fn in_memory(
        config: BillingConfig,
        catalog: ServiceCatalog,
        patients: PatientRegistry,
    ) -> Result<Self> {
        Self::new(
            config,
            catalog,
            patients,
            MemoryInvoiceStore::new(),
            SafeTimeProvider::new(TimeSource::System),
        )
    }
}

impl<S: InvoiceStore> BillingEngine<S> {
    pub fn new(
        config: BillingConfig,
        catalog: ServiceCatalog,
        patients: PatientRegistry,
        store: S,
        time: SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;
        let ledger = InvoiceLedger::new(store, &config);
        Ok(Self {
            config,
            catalog,
            patients,
            ledger,
            time,
            currency: CurrencyFormat::default(),
            aging: AgingReportGenerator::new(),
            analytics: RevenueAnalytics::new(),
        })
    }

    pub fn with_currency_format(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ServiceCatalog {
        &mut self.catalog
    }

    pub fn patients(&self) -> &PatientRegistry {
        &self.patients
    }

    pub fn patients_mut(&mut self) -> &mut PatientRegistry {
        &mut self.patients
    }

    pub fn ledger(&self) -> &InvoiceLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InvoiceLedger<S> {
        &mut self.ledger
    }

    /// build and record a draft invoice for a patient's services
    pub fn build_invoice(
        &mut self,
        patient_id: &str,
        date_of_service: NaiveDate,
        lines: &[ServiceLine],
    ) -> Result<Invoice> {
        if patient_id.trim().is_empty() {
            return Err(BillingError::validation("patient is required"));
        }
        if lines.is_empty() {
            return Err(BillingError::validation("invoice needs at least one line item"));
        }

        let patient = self.patients.lookup(patient_id)?;
        let services = lines
            .iter()
            .map(|line| {
                let service = self.catalog.lookup(&line.service_code)?;
                let billable = BillableService::from_catalog(service, line.quantity);
                Ok(match line.unit_price {
                    Some(price) => billable.with_unit_price(price),
                    None => billable,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let builder = InvoiceBuilder::new(&self.config)
            .patient(patient.id.clone())
            .insurance(patient.insurance.clone())
            .date_of_service(date_of_service)
            .items(services);

        self.ledger.create(&builder, &self.time)
    }

    pub fn send_invoice(&mut self, invoice_id: InvoiceId) -> Result<Invoice> {
        self.ledger.send(invoice_id, &self.time)
    }

    pub fn cancel_invoice(&mut self, invoice_id: InvoiceId) -> Result<Invoice> {
        self.ledger.cancel(invoice_id, &self.time)
    }

    pub fn apply_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<Invoice> {
        let request = PaymentRequest {
            invoice_id,
            amount,
            method,
            transaction_id,
            payment_date: self.time.now(),
        };
        self.ledger.apply_payment(request, &self.time)
    }

    /// aging buckets for the given invoices as of today
    pub fn get_aging_report(&self, invoices: &[Invoice]) -> AgingBucket {
        self.aging.age_invoices(invoices, self.today())
    }

    /// aging buckets over every stored invoice
    pub fn aging_report(&self) -> Result<AgingBucket> {
        let invoices = self.ledger.list(&InvoiceFilter::all())?;
        Ok(self.get_aging_report(&invoices))
    }

    pub fn get_collection_rate(&self, invoices: &[Invoice]) -> Rate {
        self.analytics.collection_rate(invoices)
    }

    /// billed total of stored invoices created within the trailing window
    pub fn revenue_by_period(&self, window: Duration) -> Result<Money> {
        let invoices = self.ledger.list(&InvoiceFilter::all())?;
        Ok(self
            .analytics
            .revenue_by_period(&invoices, window, self.time.now()))
    }

    pub fn top_services(&self, limit: usize) -> Result<Vec<ServiceRevenue>> {
        let invoices = self.ledger.list(&InvoiceFilter::all())?;
        Ok(self.analytics.top_services(&invoices, limit))
    }

    pub fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        self.ledger.get(invoice_id)
    }

    pub fn payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>> {
        self.ledger.payments(invoice_id)
    }

    pub fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        self.ledger.list(filter)
    }

    pub fn is_overdue(&self, invoice: &Invoice) -> bool {
        lifecycle::is_overdue(invoice, self.today())
    }

    pub fn view(&self, invoice_id: InvoiceId) -> Result<InvoiceView> {
        let invoice = self.ledger.get(invoice_id)?;
        Ok(InvoiceView::from_invoice(&invoice, self.today(), &self.currency))
    }
}
