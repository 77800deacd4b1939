//! insurance reimbursement allocation for a single billed service

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::reference::InsuranceProfile;

/// inputs to one allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationInput {
    pub service_price: Money,
    pub coverage: Rate,
    pub deductible: Money,
    pub deductible_met: Money,
    pub copay: Money,
}

impl AllocationInput {
    /// inputs for a service billed against an insurance profile
    pub fn for_profile(service_price: Money, coverage: Rate, profile: &InsuranceProfile) -> Self {
        Self {
            service_price,
            coverage,
            deductible: profile.deductible,
            deductible_met: profile.deductible_met,
            copay: profile.copay,
        }
    }

    /// uninsured: no coverage, no deductible, no copay
    pub fn self_pay(service_price: Money) -> Self {
        Self {
            service_price,
            coverage: Rate::ZERO,
            deductible: Money::ZERO,
            deductible_met: Money::ZERO,
            copay: Money::ZERO,
        }
    }
}

/// split of a service between insurer and patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Allocation {
    pub insurer_pays: Money,
    pub patient_pays: Money,
    /// portion of the patient share that went toward the deductible
    pub deductible_applied: Money,
    pub coinsurance: Money,
    pub copay: Money,
}

impl Allocation {
    pub fn total(&self) -> Money {
        self.insurer_pays + self.patient_pays
    }
}

/// splits service prices between insurer and patient
#[derive(Debug, Clone, Copy, Default)]
pub struct ReimbursementCalculator;

impl ReimbursementCalculator {
    pub fn new() -> Self {
        Self
    }

    /// allocate a service price
    ///
    /// the result conserves `service_price + copay` to the cent; any rounding
    /// remainder lands on the patient share. A zero-priced service yields a zero
    /// allocation and no copay.
    pub fn allocate(&self, input: AllocationInput) -> Allocation {
        let price = input.service_price.non_negative();
        if price.is_zero() {
            return Allocation::default();
        }

        let copay = input.copay.non_negative();
        let coverage = clamp_coverage(input.coverage);

        let remaining_deductible = (input.deductible - input.deductible_met).non_negative();
        let deductible_applied = price.min(remaining_deductible);
        let amount_after_deductible = price - deductible_applied;

        let insurer_share = amount_after_deductible.as_decimal() * coverage.as_fraction();
        let insurer_pays = Money::from_decimal(insurer_share);
        let coinsurance =
            Money::from_decimal(amount_after_deductible.as_decimal() - insurer_share);

        let mut patient_pays = deductible_applied + coinsurance + copay;
        let expected = price + copay;
        if insurer_pays + patient_pays != expected {
            patient_pays = expected - insurer_pays;
        }

        tracing::debug!(
            price = %price,
            coverage = %coverage,
            deductible_applied = %deductible_applied,
            insurer_pays = %insurer_pays,
            patient_pays = %patient_pays,
            "service allocated"
        );

        Allocation {
            insurer_pays,
            patient_pays,
            deductible_applied,
            coinsurance: patient_pays - deductible_applied - copay,
            copay,
        }
    }
}

fn clamp_coverage(rate: Rate) -> Rate {
    if rate < Rate::ZERO {
        Rate::ZERO
    } else if rate > Rate::FULL {
        Rate::FULL
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn allocate(price: i64, coverage: u32, deductible: i64, met: i64, copay: i64) -> Allocation {
        ReimbursementCalculator::new().allocate(AllocationInput {
            service_price: Money::from_major(price),
            coverage: Rate::from_percentage(coverage),
            deductible: Money::from_major(deductible),
            deductible_met: Money::from_major(met),
            copay: Money::from_major(copay),
        })
    }

    #[test]
    fn test_deductible_already_met() {
        let a = allocate(85, 75, 1000, 1000, 20);
        assert_eq!(a.deductible_applied, Money::ZERO);
        assert_eq!(a.insurer_pays, Money::from_str_exact("63.75").unwrap());
        assert_eq!(a.patient_pays, Money::from_str_exact("41.25").unwrap());
        assert_eq!(a.coinsurance, Money::from_str_exact("21.25").unwrap());
    }

    #[test]
    fn test_service_absorbed_by_deductible() {
        let a = allocate(150, 80, 1500, 800, 25);
        assert_eq!(a.deductible_applied, Money::from_major(150));
        assert_eq!(a.insurer_pays, Money::ZERO);
        assert_eq!(a.patient_pays, Money::from_major(175));
    }

    #[test]
    fn test_deductible_partially_remaining() {
        // 100 of deductible left on a 300 service at 80%
        let a = allocate(300, 80, 500, 400, 10);
        assert_eq!(a.deductible_applied, Money::from_major(100));
        assert_eq!(a.insurer_pays, Money::from_major(160));
        assert_eq!(a.coinsurance, Money::from_major(40));
        assert_eq!(a.patient_pays, Money::from_major(150));
    }

    #[test]
    fn test_zero_price_charges_nothing() {
        let a = allocate(0, 80, 1000, 0, 25);
        assert_eq!(a, Allocation::default());
    }

    #[test]
    fn test_zero_coverage() {
        let a = allocate(200, 0, 0, 0, 15);
        assert_eq!(a.insurer_pays, Money::ZERO);
        assert_eq!(a.patient_pays, Money::from_major(215));
    }

    #[test]
    fn test_met_above_deductible_applies_nothing() {
        let a = allocate(100, 50, 500, 900, 0);
        assert_eq!(a.deductible_applied, Money::ZERO);
        assert_eq!(a.insurer_pays, Money::from_major(50));
    }

    #[test]
    fn test_rounding_remainder_goes_to_patient() {
        // 33.33% of 10.01 = 3.336333 -> insurer 3.34, coinsurance 6.673667 -> 6.67
        let a = ReimbursementCalculator::new().allocate(AllocationInput {
            service_price: Money::from_str_exact("10.01").unwrap(),
            coverage: Rate::from_percentage_decimal(dec!(33.33)),
            deductible: Money::ZERO,
            deductible_met: Money::ZERO,
            copay: Money::from_major(5),
        });
        assert_eq!(a.insurer_pays, Money::from_str_exact("3.34").unwrap());
        assert_eq!(a.total(), Money::from_str_exact("15.01").unwrap());
    }

    #[test]
    fn test_self_pay() {
        let a = ReimbursementCalculator::new()
            .allocate(AllocationInput::self_pay(Money::from_major(120)));
        assert_eq!(a.insurer_pays, Money::ZERO);
        assert_eq!(a.patient_pays, Money::from_major(120));
        assert_eq!(a.copay, Money::ZERO);
    }
}
