//! reference data consumed by the billing core: service catalog and patient insurance

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};
use crate::types::PatientId;

/// service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Consultation,
    Diagnostic,
    Laboratory,
    Procedure,
    Imaging,
    Preventive,
    Therapy,
    Other,
}

/// billable service definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCode {
    pub code: String,
    pub description: String,
    pub category: ServiceCategory,
    pub base_price: Money,
    pub insurance_coverage_percent: Rate,
    pub duration_minutes: u32,
}

impl ServiceCode {
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(BillingError::validation("service code must not be empty"));
        }
        if self.base_price.is_negative() {
            return Err(BillingError::validation(format!(
                "service {} has negative base price {}",
                self.code, self.base_price
            )));
        }
        if !self.insurance_coverage_percent.is_valid_percentage() {
            return Err(BillingError::validation(format!(
                "service {} coverage {} outside 0-100",
                self.code, self.insurance_coverage_percent
            )));
        }
        Ok(())
    }
}

/// catalog of billable services keyed by code
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: HashMap<String, ServiceCode>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// add a service; codes are unique
    pub fn insert(&mut self, service: ServiceCode) -> Result<()> {
        service.validate()?;
        if self.services.contains_key(&service.code) {
            return Err(BillingError::validation(format!(
                "service code {} already in catalog",
                service.code
            )));
        }
        self.services.insert(service.code.clone(), service);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&ServiceCode> {
        self.services.get(code)
    }

    pub fn lookup(&self, code: &str) -> Result<&ServiceCode> {
        self.get(code).ok_or_else(|| BillingError::UnknownServiceCode {
            code: code.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceCode> {
        self.services.values()
    }
}

/// patient insurance coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceProfile {
    pub provider: String,
    pub policy_number: String,
    pub copay: Money,
    pub deductible: Money,
    /// amount already applied toward the deductible, maintained outside this crate
    pub deductible_met: Money,
}

impl InsuranceProfile {
    pub fn validate(&self) -> Result<()> {
        if self.copay.is_negative() {
            return Err(BillingError::validation("copay must not be negative"));
        }
        if self.deductible.is_negative() {
            return Err(BillingError::validation("deductible must not be negative"));
        }
        if self.deductible_met.is_negative() || self.deductible_met > self.deductible {
            return Err(BillingError::validation(format!(
                "deductible met {} outside 0..={}",
                self.deductible_met, self.deductible
            )));
        }
        Ok(())
    }

    pub fn remaining_deductible(&self) -> Money {
        (self.deductible - self.deductible_met).non_negative()
    }
}

/// patient as seen by billing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: String,
    pub insurance: Option<InsuranceProfile>,
}

/// in-memory view of the patient-records system
#[derive(Debug, Clone, Default)]
pub struct PatientRegistry {
    patients: HashMap<PatientId, PatientRecord>,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// add or replace a patient
    pub fn upsert(&mut self, patient: PatientRecord) -> Result<()> {
        if patient.id.trim().is_empty() {
            return Err(BillingError::validation("patient id must not be empty"));
        }
        if let Some(profile) = &patient.insurance {
            profile.validate()?;
        }
        self.patients.insert(patient.id.clone(), patient);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.patients.get(id)
    }

    pub fn lookup(&self, id: &str) -> Result<&PatientRecord> {
        self.get(id).ok_or_else(|| BillingError::UnknownPatient { id: id.to_string() })
    }
}
