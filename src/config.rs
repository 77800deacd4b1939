use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};

/// smallest invoice-number suffix width
pub const MIN_SUFFIX_DIGITS: u32 = 6;

/// billing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// days between invoice creation and due date
    pub payment_terms_days: u32,
    /// charge the copay on every billed line rather than once per invoice
    pub copay_per_line_item: bool,
    /// how the deductible is consumed across lines of one invoice
    pub deductible_application: DeductibleApplication,
    pub invoice_numbering: NumberingConfig,
}

/// deductible handling within a single invoice build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductibleApplication {
    /// every line sees the deductible-met value read at build start
    Snapshot,
    /// lines are folded in order, each one advancing a running deductible-met
    Sequential,
}

/// invoice number generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    pub prefix: String,
    pub suffix_digits: u32,
    pub strategy: NumberingStrategy,
    /// attempts before a collision is surfaced to the caller
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingStrategy {
    Sequential,
    TimeDerived,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            prefix: "INV".to_string(),
            suffix_digits: MIN_SUFFIX_DIGITS,
            strategy: NumberingStrategy::Sequential,
            max_attempts: 5,
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl BillingConfig {
    /// copay on every line, deductible snapshot per invoice, net-30
    pub fn standard() -> Self {
        Self {
            payment_terms_days: 30,
            copay_per_line_item: true,
            deductible_application: DeductibleApplication::Snapshot,
            invoice_numbering: NumberingConfig::default(),
        }
    }

    /// one copay per encounter and a running deductible across lines
    pub fn per_encounter_copay() -> Self {
        Self {
            copay_per_line_item: false,
            deductible_application: DeductibleApplication::Sequential,
            ..Self::standard()
        }
    }

    /// parse and validate a JSON document; missing fields take standard values
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BillingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.payment_terms_days == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "payment_terms_days must be at least 1".to_string(),
            });
        }

        let numbering = &self.invoice_numbering;
        if numbering.prefix.trim().is_empty() {
            return Err(BillingError::InvalidConfiguration {
                message: "invoice number prefix must not be empty".to_string(),
            });
        }
        if numbering.suffix_digits < MIN_SUFFIX_DIGITS || numbering.suffix_digits > 18 {
            return Err(BillingError::InvalidConfiguration {
                message: format!(
                    "suffix_digits must be between {} and 18, got {}",
                    MIN_SUFFIX_DIGITS, numbering.suffix_digits
                ),
            });
        }
        if numbering.max_attempts == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "max_attempts must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defaults() {
        let config = BillingConfig::standard();
        assert_eq!(config.payment_terms_days, 30);
        assert!(config.copay_per_line_item);
        assert_eq!(config.deductible_application, DeductibleApplication::Snapshot);
        assert_eq!(config.invoice_numbering.prefix, "INV");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = BillingConfig::from_json(
            r#"{ "copay_per_line_item": false, "invoice_numbering": { "suffix_digits": 8 } }"#,
        )
        .unwrap();

        assert!(!config.copay_per_line_item);
        assert_eq!(config.payment_terms_days, 30);
        assert_eq!(config.invoice_numbering.suffix_digits, 8);
        assert_eq!(config.invoice_numbering.prefix, "INV");
    }

    #[test]
    fn test_from_json_rejects_short_suffix() {
        let err = BillingConfig::from_json(r#"{ "invoice_numbering": { "suffix_digits": 4 } }"#)
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = BillingConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BillingError::Serialization(_)));
    }

    #[test]
    fn test_per_encounter_preset() {
        let config = BillingConfig::per_encounter_copay();
        assert!(!config.copay_per_line_item);
        assert_eq!(config.deductible_application, DeductibleApplication::Sequential);
        assert_eq!(config.payment_terms_days, 30);
    }
}
