pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod format;
pub mod invoice;
pub mod ledger;
pub mod lifecycle;
pub mod numbering;
pub mod payments;
pub mod reference;
pub mod reimbursement;
pub mod reports;
pub mod store;
pub mod types;
pub mod view;

// re-export key types
pub use config::{BillingConfig, DeductibleApplication, NumberingConfig, NumberingStrategy};
pub use decimal::{Money, Rate};
pub use engine::{BillingEngine, ServiceLine};
pub use errors::{BillingError, Result};
pub use events::{BillingEvent, EventStore};
pub use format::CurrencyFormat;
pub use invoice::{BillableService, BillingLineItem, Invoice, InvoiceBuilder};
pub use ledger::InvoiceLedger;
pub use lifecycle::{display_status, is_overdue};
pub use payments::{PaymentOutcome, PaymentProcessor, PaymentRequest};
pub use reference::{
    InsuranceProfile, PatientRecord, PatientRegistry, ServiceCatalog, ServiceCategory,
    ServiceCode,
};
pub use reimbursement::{Allocation, AllocationInput, ReimbursementCalculator};
pub use reports::{AgingLine, AgingReportGenerator, RevenueAnalytics, ServiceRevenue};
pub use store::{InvoiceFilter, InvoiceStore, MemoryInvoiceStore, VersionedInvoice};
pub use types::{
    AgingBucket, AgingCategory, DisplayStatus, InvoiceId, InvoiceStatus, PatientId, Payment,
    PaymentId, PaymentMethod,
};
pub use view::InvoiceView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
