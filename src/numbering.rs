use chrono::{DateTime, Datelike, Utc};

use crate::config::{NumberingConfig, NumberingStrategy};

/// produces `PREFIX-YYYY-NNNNNN` invoice numbers
#[derive(Debug, Clone)]
pub struct InvoiceNumberGenerator {
    config: NumberingConfig,
    counter: u64,
}

impl InvoiceNumberGenerator {
    pub fn new(config: NumberingConfig) -> Self {
        Self { config, counter: 0 }
    }

    /// resume a sequential series after `last_issued`
    pub fn starting_after(config: NumberingConfig, last_issued: u64) -> Self {
        Self {
            config,
            counter: last_issued,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// next candidate; `attempt` is the zero-based retry index for this invoice
    pub fn next_candidate(&mut self, now: DateTime<Utc>, attempt: u32) -> String {
        let raw = match self.config.strategy {
            NumberingStrategy::Sequential => {
                self.counter += 1;
                self.counter
            }
            NumberingStrategy::TimeDerived => {
                let millis = now.timestamp_millis().unsigned_abs();
                millis.wrapping_add(attempt as u64)
            }
        };
        // widths past u64 range hold any value unreduced
        let suffix = match 10u64.checked_pow(self.config.suffix_digits) {
            Some(modulus) => raw % modulus,
            None => raw,
        };

        format!(
            "{}-{:04}-{:0width$}",
            self.config.prefix,
            now.year(),
            suffix,
            width = self.config.suffix_digits as usize
        )
    }
}

/// true if `number` has the `PREFIX-YYYY-digits` shape with at least `min_digits`
pub fn is_well_formed(number: &str, prefix: &str, min_digits: u32) -> bool {
    let Some(rest) = number.strip_prefix(prefix).and_then(|r| r.strip_prefix('-')) else {
        return false;
    };
    let mut parts = rest.splitn(2, '-');
    let (Some(year), Some(suffix)) = (parts.next(), parts.next()) else {
        return false;
    };
    year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && suffix.len() >= min_digits as usize
        && suffix.chars().all(|c| c.is_ascii_digit())
}
