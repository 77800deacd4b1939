use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InvoiceId, InvoiceStatus};

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("invalid payment: amount {amount} exceeds balance due {balance_due}")]
    InvalidPayment {
        amount: Money,
        balance_due: Money,
    },

    #[error("invoice closed: current status is {status:?}")]
    InvoiceClosed {
        status: InvoiceStatus,
    },

    #[error("duplicate invoice number: {number}")]
    DuplicateInvoiceNumber {
        number: String,
    },

    #[error("invoice not found: {id}")]
    InvoiceNotFound {
        id: InvoiceId,
    },

    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("concurrent modification of invoice {id}: expected version {expected}, found {found}")]
    ConcurrentModification {
        id: InvoiceId,
        expected: u64,
        found: u64,
    },

    #[error("unknown service code: {code}")]
    UnknownServiceCode {
        code: String,
    },

    #[error("unknown patient: {id}")]
    UnknownPatient {
        id: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BillingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
