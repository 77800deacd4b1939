use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for an invoice
pub type InvoiceId = Uuid;

/// unique identifier for a payment record
pub type PaymentId = Uuid;

/// patient identifier as issued by the patient-records system
pub type PatientId = String;

/// stored invoice status
///
/// overdue is not a stored state; see [`crate::lifecycle::is_overdue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// built but not yet sent to the patient
    Draft,
    /// sent to the patient, nothing paid
    Sent,
    /// some but not all of the total paid
    Partial,
    /// fully paid
    Paid,
    /// voided, balance frozen
    Cancelled,
}

impl InvoiceStatus {
    /// no further transitions or payments
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// states that still carry a receivable
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Partial
        )
    }
}

/// status as shown to users, with overdue derived from the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Draft,
    Sent,
    Partial,
    Paid,
    Overdue,
    Cancelled,
}

impl From<InvoiceStatus> for DisplayStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Draft => DisplayStatus::Draft,
            InvoiceStatus::Sent => DisplayStatus::Sent,
            InvoiceStatus::Partial => DisplayStatus::Partial,
            InvoiceStatus::Paid => DisplayStatus::Paid,
            InvoiceStatus::Cancelled => DisplayStatus::Cancelled,
        }
    }
}

/// how a payment was tendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    CreditCard,
    DebitCard,
    BankTransfer,
    Insurance,
}

/// immutable payment log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}

/// receivable aging bucket totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgingBucket {
    pub current: Money,
    pub days31to60: Money,
    pub days61to90: Money,
    pub days90plus: Money,
    pub total: Money,
}

/// which aging bucket a balance falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingCategory {
    Current,
    Days31To60,
    Days61To90,
    Days90Plus,
}

impl AgingCategory {
    /// classify by days past the due date
    pub fn from_days_overdue(days: i64) -> Self {
        match days {
            d if d <= 30 => AgingCategory::Current,
            31..=60 => AgingCategory::Days31To60,
            61..=90 => AgingCategory::Days61To90,
            _ => AgingCategory::Days90Plus,
        }
    }
}

impl AgingBucket {
    /// add a balance into its bucket and the running total
    pub fn add(&mut self, category: AgingCategory, amount: Money) {
        match category {
            AgingCategory::Current => self.current += amount,
            AgingCategory::Days31To60 => self.days31to60 += amount,
            AgingCategory::Days61To90 => self.days61to90 += amount,
            AgingCategory::Days90Plus => self.days90plus += amount,
        }
        self.total += amount;
    }

    pub fn bucket_sum(&self) -> Money {
        self.current + self.days31to60 + self.days61to90 + self.days90plus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(InvoiceStatus::Cancelled.is_terminal());
        assert!(!InvoiceStatus::Draft.is_terminal());
        assert!(!InvoiceStatus::Partial.is_terminal());
    }

    #[test]
    fn test_aging_category_boundaries() {
        assert_eq!(AgingCategory::from_days_overdue(0), AgingCategory::Current);
        assert_eq!(AgingCategory::from_days_overdue(30), AgingCategory::Current);
        assert_eq!(AgingCategory::from_days_overdue(31), AgingCategory::Days31To60);
        assert_eq!(AgingCategory::from_days_overdue(60), AgingCategory::Days31To60);
        assert_eq!(AgingCategory::from_days_overdue(61), AgingCategory::Days61To90);
        assert_eq!(AgingCategory::from_days_overdue(90), AgingCategory::Days61To90);
        assert_eq!(AgingCategory::from_days_overdue(91), AgingCategory::Days90Plus);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&InvoiceStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
