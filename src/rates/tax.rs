use chrono::NaiveDate;

use crate::decimal::Money;
use crate::providers::{TaxRate, TaxRateProvider};
use crate::types::TaxRateId;

/// tax computed for one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxAssessment {
    pub rate_id: Option<TaxRateId>,
    pub amount: Money,
}

impl TaxAssessment {
    pub const NONE: TaxAssessment = TaxAssessment {
        rate_id: None,
        amount: Money::ZERO,
    };
}

/// resolves tax from a jurisdiction's rate history
pub struct TaxCalculator<'a> {
    provider: &'a dyn TaxRateProvider,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(provider: &'a dyn TaxRateProvider) -> Self {
        Self { provider }
    }

    /// latest rate in the history valid on `date`
    pub fn rate_on(&self, jurisdiction: &str, date: NaiveDate) -> Option<TaxRate> {
        self.provider
            .rates_for_jurisdiction(jurisdiction)
            .into_iter()
            .filter(|rate| rate.is_valid_on(date))
            .last()
    }

    /// tax on `amount` at `date`
    ///
    /// The line's current rate is kept while it remains valid; otherwise the
    /// history is searched. No valid rate means no tax.
    pub fn assess(
        &self,
        amount: Money,
        jurisdiction: &str,
        current_rate_id: Option<TaxRateId>,
        date: NaiveDate,
    ) -> TaxAssessment {
        let current = current_rate_id
            .and_then(|id| self.provider.rate_by_id(jurisdiction, id))
            .filter(|rate| rate.is_valid_on(date));

        match current.or_else(|| self.rate_on(jurisdiction, date)) {
            Some(rate) => TaxAssessment {
                rate_id: Some(rate.id),
                amount: amount.scale(rate.multiplier),
            },
            None => {
                tracing::warn!(jurisdiction, %date, "no tax rate valid on date, assessing zero tax");
                TaxAssessment::NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::fixtures::{date, reference_data};
    use crate::providers::InMemoryReferenceData;
    use rust_decimal_macros::dec;

    fn two_rate_history() -> InMemoryReferenceData {
        InMemoryReferenceData::new()
            .with_tax_rate(
                "AU-NSW",
                TaxRate {
                    id: 7,
                    valid_from: date(2023, 1, 1),
                    valid_to: Some(date(2024, 6, 30)),
                    multiplier: Rate::from_percent(dec!(10)),
                },
            )
            .with_tax_rate(
                "AU-NSW",
                TaxRate {
                    id: 8,
                    valid_from: date(2024, 7, 1),
                    valid_to: None,
                    multiplier: Rate::from_percent(dec!(12.5)),
                },
            )
    }

    #[test]
    fn test_rate_valid_on_review_date() {
        let data = two_rate_history();
        let tax = TaxCalculator::new(&data);

        let before = tax.assess(Money::from_major(1_000), "AU-NSW", None, date(2024, 6, 30));
        assert_eq!(before.rate_id, Some(7));
        assert_eq!(before.amount, Money::from_major(100));

        let after = tax.assess(Money::from_major(1_000), "AU-NSW", None, date(2024, 7, 1));
        assert_eq!(after.rate_id, Some(8));
        assert_eq!(after.amount, Money::from_major(125));
    }

    #[test]
    fn test_expired_current_rate_is_replaced() {
        let data = two_rate_history();
        let tax = TaxCalculator::new(&data);

        let kept = tax.assess(Money::from_major(200), "AU-NSW", Some(7), date(2024, 3, 1));
        assert_eq!(kept.rate_id, Some(7));

        let replaced = tax.assess(Money::from_major(200), "AU-NSW", Some(7), date(2024, 9, 1));
        assert_eq!(replaced.rate_id, Some(8));
        assert_eq!(replaced.amount, Money::from_major(25));
    }

    #[test]
    fn test_unknown_jurisdiction_assesses_nothing() {
        let data = reference_data();
        let tax = TaxCalculator::new(&data);

        assert_eq!(
            tax.assess(Money::from_major(500), "NZ-AKL", None, date(2024, 3, 1)),
            TaxAssessment::NONE
        );
        assert_eq!(tax.rate_on("US-CA", date(2023, 12, 31)), None);
    }
}
