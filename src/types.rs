use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ReviewError;

/// asset identifier from the asset master data
pub type AssetId = u64;

/// cost category identifier from the category master data
pub type CategoryId = u64;

/// caller-supplied review token, stable across edits
pub type ReviewToken = String;

/// tax rate identifier within a jurisdiction
pub type TaxRateId = u64;

/// cpi region identifier
pub type CpiRegionId = u64;

/// identifier of a persisted or not-yet-persisted entity
///
/// Persisted rows always carry a positive id. Anything synthesized during a
/// computation carries a pending token until the persistence boundary
/// assigns the real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identifier {
    Persisted(u64),
    Pending(u32),
}

impl Identifier {
    /// decode the storage convention where anything <= 0 is unpersisted
    pub fn from_raw(raw: i64) -> crate::errors::Result<Self> {
        if raw > 0 {
            return Ok(Identifier::Persisted(raw.unsigned_abs()));
        }
        u32::try_from(raw.unsigned_abs())
            .map(Identifier::Pending)
            .map_err(|_| ReviewError::InvalidIdentifier { raw })
    }

    /// encode back into the storage convention
    pub fn to_raw(&self) -> i64 {
        match self {
            Identifier::Persisted(id) => *id as i64,
            Identifier::Pending(token) => -(*token as i64),
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Identifier::Persisted(_))
    }

    pub fn persisted_id(&self) -> Option<u64> {
        match self {
            Identifier::Persisted(id) => Some(*id),
            Identifier::Pending(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Persisted(id) => write!(f, "#{}", id),
            Identifier::Pending(token) => write!(f, "new-{}", token),
        }
    }
}

/// periodic unit a cost is billed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentPattern {
    Weeks,
    #[default]
    Months,
    Quarters,
    Years,
}

impl PaymentPattern {
    /// parse a stored pattern name; unknown names bill monthly
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// number of billing units in a year
    pub fn units_per_year(&self) -> u32 {
        match self {
            PaymentPattern::Weeks => 52,
            PaymentPattern::Months => 12,
            PaymentPattern::Quarters => 4,
            PaymentPattern::Years => 1,
        }
    }

    /// whether the pattern is calendar-month based
    pub fn is_month_based(&self) -> bool {
        !matches!(self, PaymentPattern::Weeks)
    }
}

impl FromStr for PaymentPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weeks" | "weekly" => Ok(PaymentPattern::Weeks),
            "months" | "monthly" => Ok(PaymentPattern::Months),
            "quarters" | "quarterly" => Ok(PaymentPattern::Quarters),
            "years" | "yearly" | "annually" => Ok(PaymentPattern::Years),
            other => Err(format!("unknown payment pattern: {}", other)),
        }
    }
}

/// review types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewType {
    /// baseline costs at lease start
    Commencing,
    /// flat replacement amount
    Fixed,
    /// fixed percentage increase
    FixedPercent,
    /// market re-rate from an estimate
    Market,
    /// cpi re-rate from an estimate
    Cpi,
    /// ad-hoc mid-term change
    Adjustment,
}

impl ReviewType {
    /// whether cost matching includes the free-text label
    pub fn matches_on_label(&self) -> bool {
        !matches!(self, ReviewType::Market | ReviewType::Cpi)
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewType::Commencing => "Commencing",
            ReviewType::Fixed => "Fixed",
            ReviewType::FixedPercent => "Fixed %",
            ReviewType::Market => "Market",
            ReviewType::Cpi => "CPI",
            ReviewType::Adjustment => "Adjustment",
        };
        f.write_str(name)
    }
}

/// review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    Pending,
    Actioned,
}

/// term state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermState {
    Pending,
    Exercised,
}

/// key used to match cost lines against review targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CostKey {
    pub asset_id: AssetId,
    pub category_id: CategoryId,
    pub label: String,
}

impl CostKey {
    pub fn new(asset_id: AssetId, category_id: CategoryId, label: impl Into<String>) -> Self {
        Self {
            asset_id,
            category_id,
            label: label.into(),
        }
    }

    /// compare under a review type's matching rule
    pub fn matches(&self, other: &CostKey, review_type: ReviewType) -> bool {
        self.asset_id == other.asset_id
            && self.category_id == other.category_id
            && (!review_type.matches_on_label() || self.label == other.label)
    }
}

impl fmt::Display for CostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset {} / category {}", self.asset_id, self.category_id)?;
        if !self.label.is_empty() {
            write!(f, " / {:?}", self.label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_storage_convention() {
        assert_eq!(Identifier::from_raw(42).unwrap(), Identifier::Persisted(42));
        assert_eq!(Identifier::from_raw(-3).unwrap(), Identifier::Pending(3));
        assert_eq!(Identifier::from_raw(0).unwrap(), Identifier::Pending(0));
        assert_eq!(
            Identifier::from_raw(-(u32::MAX as i64)).unwrap(),
            Identifier::Pending(u32::MAX)
        );
        assert!(matches!(
            Identifier::from_raw(-(u32::MAX as i64) - 1),
            Err(ReviewError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            Identifier::from_raw(i64::MIN),
            Err(ReviewError::InvalidIdentifier { raw: i64::MIN })
        ));
        assert_eq!(Identifier::Pending(7).to_raw(), -7);
        assert!(!Identifier::Pending(7).is_persisted());
        assert_eq!(Identifier::Persisted(9).persisted_id(), Some(9));
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!(PaymentPattern::parse_or_default("Weeks"), PaymentPattern::Weeks);
        assert_eq!(PaymentPattern::parse_or_default("quarterly"), PaymentPattern::Quarters);
        assert_eq!(PaymentPattern::parse_or_default("fortnights"), PaymentPattern::Months);
    }

    #[test]
    fn test_label_matching_rule() {
        let a = CostKey::new(1, 10, "Base");
        let b = CostKey::new(1, 10, "Outgoings");

        assert!(!a.matches(&b, ReviewType::Fixed));
        assert!(!a.matches(&b, ReviewType::FixedPercent));
        assert!(a.matches(&b, ReviewType::Market));
        assert!(a.matches(&b, ReviewType::Cpi));
        assert!(!a.matches(&CostKey::new(2, 10, "Base"), ReviewType::Market));
    }
}
