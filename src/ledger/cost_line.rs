use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AssetId, CategoryId, CostKey, Identifier, PaymentPattern, TaxRateId};

/// one recurring charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub id: Identifier,
    /// the line this one was re-versioned from
    pub source_id: Option<Identifier>,
    pub asset_id: AssetId,
    pub category_id: CategoryId,
    /// free-text disambiguator between lines of one asset and category
    pub label: String,
    pub payment_amount: Money,
    pub yearly_amount: Money,
    pub payment_frequency: u32,
    pub payment_pattern: PaymentPattern,
    pub first_payment_date: NaiveDate,
    pub tax_jurisdiction: String,
    pub tax_rate_id: Option<TaxRateId>,
    pub tax_amount: Money,
    /// changed by the review that owns the snapshot
    pub actioned: bool,
    /// values before the owning review, kept for display and audit
    pub previous: Option<PriorValues>,
}

/// pre-review shadow of a cost line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorValues {
    pub payment_amount: Money,
    pub yearly_amount: Money,
    pub tax_amount: Money,
    pub payment_frequency: u32,
    pub payment_pattern: PaymentPattern,
    pub first_payment_date: NaiveDate,
}

impl CostLine {
    pub fn key(&self) -> CostKey {
        CostKey::new(self.asset_id, self.category_id, self.label.clone())
    }

    pub fn old_payment_amount(&self) -> Option<Money> {
        self.previous.as_ref().map(|p| p.payment_amount)
    }

    pub fn old_yearly_amount(&self) -> Option<Money> {
        self.previous.as_ref().map(|p| p.yearly_amount)
    }

    pub fn old_first_payment_date(&self) -> Option<NaiveDate> {
        self.previous.as_ref().map(|p| p.first_payment_date)
    }

    /// amount including tax
    pub fn gross_payment_amount(&self) -> Money {
        self.payment_amount + self.tax_amount
    }

    fn prior_values(&self) -> PriorValues {
        PriorValues {
            payment_amount: self.payment_amount,
            yearly_amount: self.yearly_amount,
            tax_amount: self.tax_amount,
            payment_frequency: self.payment_frequency,
            payment_pattern: self.payment_pattern,
            first_payment_date: self.first_payment_date,
        }
    }

    /// copy into a new snapshot untouched by its review
    pub fn carried_forward(&self) -> CostLine {
        CostLine {
            actioned: false,
            previous: None,
            ..self.clone()
        }
    }

    /// copy into a new snapshot as a fresh version of this line
    pub fn reversioned(&self, new_id: Identifier, actioned: bool) -> CostLine {
        CostLine {
            id: new_id,
            source_id: Some(self.id),
            actioned,
            previous: Some(self.prior_values()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cost_line, date};

    #[test]
    fn test_reversioned_keeps_shadow_values() {
        let line = cost_line(Identifier::Persisted(5), 1, 10, "Base", 1_000);
        let next = line.reversioned(Identifier::Pending(1), true);

        assert_eq!(next.id, Identifier::Pending(1));
        assert_eq!(next.source_id, Some(Identifier::Persisted(5)));
        assert!(next.actioned);
        assert_eq!(next.old_payment_amount(), Some(Money::from_major(1_000)));
        assert_eq!(next.old_first_payment_date(), Some(date(2024, 1, 1)));
        assert_eq!(next.key(), line.key());
    }

    #[test]
    fn test_carried_forward_clears_review_markers() {
        let mut line = cost_line(Identifier::Persisted(5), 1, 10, "Base", 1_000)
            .reversioned(Identifier::Pending(2), true);
        line.tax_amount = Money::from_major(80);

        let carried = line.carried_forward();
        assert!(!carried.actioned);
        assert!(carried.previous.is_none());
        assert_eq!(carried.id, Identifier::Pending(2));
        assert_eq!(carried.gross_payment_amount(), Money::from_major(1_080));
    }
}
