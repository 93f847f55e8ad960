use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::decimal::Money;
use crate::errors::{ReviewError, Result};
use crate::ledger::{CostLine, RecurringTemplate};
use crate::types::{CostKey, Identifier};

/// where a cost line sits within a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostLocation {
    Template(Identifier),
    Unattached,
}

/// a cost line together with its location
#[derive(Debug, Clone, Copy)]
pub struct LocatedCost<'a> {
    pub line: &'a CostLine,
    pub location: CostLocation,
}

/// cost lines and templates of one actioned snapshot
///
/// Each cost line appears in exactly one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    /// templates rebuilt by the owning review, holding actioned and co-template lines
    pub templates: Vec<RecurringTemplate>,
    pub unattached_actioned: Vec<CostLine>,
    pub unattached_unchanged: Vec<CostLine>,
    /// templates carried over untouched
    pub unchanged_templates: Vec<RecurringTemplate>,
    pub removed: Vec<CostLine>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_templates(&self) -> impl Iterator<Item = &RecurringTemplate> {
        self.templates.iter().chain(self.unchanged_templates.iter())
    }

    pub fn template(&self, id: Identifier) -> Option<&RecurringTemplate> {
        self.all_templates().find(|t| t.template_id == id)
    }

    /// every cost line still billed, in ledger order
    pub fn active_costs(&self) -> Vec<LocatedCost<'_>> {
        let templated = self.all_templates().flat_map(|t| {
            t.costs.iter().map(move |line| LocatedCost {
                line,
                location: CostLocation::Template(t.template_id),
            })
        });
        let unattached = self
            .unattached_actioned
            .iter()
            .chain(self.unattached_unchanged.iter())
            .map(|line| LocatedCost {
                line,
                location: CostLocation::Unattached,
            });
        templated.chain(unattached).collect()
    }

    pub fn cost_count(&self) -> usize {
        self.all_templates().map(|t| t.costs.len()).sum::<usize>()
            + self.unattached_actioned.len()
            + self.unattached_unchanged.len()
    }

    pub fn actioned_count(&self) -> usize {
        self.active_costs().iter().filter(|c| c.line.actioned).count()
    }

    /// first active line with the exact key
    pub fn find_line(&self, key: &CostKey) -> Option<&CostLine> {
        self.active_costs()
            .into_iter()
            .map(|c| c.line)
            .find(|line| &line.key() == key)
    }

    /// actioned line this ledger derived the same way as `line`
    ///
    /// Re-versioned lines match on the prior line they came from. New lines
    /// have no lineage and match on their minted id and key.
    pub fn find_counterpart(&self, line: &CostLine) -> Option<&CostLine> {
        self.active_costs()
            .into_iter()
            .map(|c| c.line)
            .filter(|earlier| earlier.actioned)
            .find(|earlier| match line.source_id {
                Some(source_id) => earlier.source_id == Some(source_id),
                None => earlier.source_id.is_none() && earlier.id == line.id && earlier.key() == line.key(),
            })
    }

    /// yearly total of all active lines
    pub fn yearly_total(&self) -> Money {
        self.active_costs().iter().map(|c| c.line.yearly_amount).sum()
    }

    /// highest pending token in use, so new tokens never collide
    pub fn max_pending_token(&self) -> u32 {
        let line_ids = self
            .active_costs()
            .into_iter()
            .map(|c| c.line.id)
            .chain(self.removed.iter().map(|c| c.id));
        let template_ids = self.all_templates().map(|t| t.template_id);

        line_ids
            .chain(template_ids)
            .filter_map(|id| match id {
                Identifier::Pending(token) => Some(token),
                Identifier::Persisted(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// check each line and template appears once and templates are not empty
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let lines = self
            .active_costs()
            .into_iter()
            .map(|c| c.line)
            .chain(self.removed.iter());
        for line in lines {
            if !seen.insert(line.id) {
                return Err(ReviewError::CorruptedSnapshot {
                    message: format!("cost line {} appears more than once", line.id),
                });
            }
        }

        let mut templates = HashSet::new();
        for template in self.all_templates() {
            if !templates.insert(template.template_id) {
                return Err(ReviewError::CorruptedSnapshot {
                    message: format!("template {} appears more than once", template.template_id),
                });
            }
            if template.costs.is_empty() {
                return Err(ReviewError::CorruptedSnapshot {
                    message: format!("template {} has no cost lines", template.template_id),
                });
            }
        }

        Ok(())
    }
}

/// output of actioning a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionedSnapshot {
    pub effective_date: NaiveDate,
    /// tie-break between reviews actioned on the same day
    pub priority: i32,
    pub actioned_date: DateTime<Utc>,
    pub actioned_by: String,
    /// resolved region label for cpi reviews
    pub cpi_region: Option<String>,
    pub ledger: CostLedger,
}

impl ActionedSnapshot {
    /// timeline ordering key
    pub fn key(&self) -> (NaiveDate, i32) {
        (self.effective_date, self.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cost_line, template};
    use crate::types::PaymentPattern;

    fn sample_ledger() -> CostLedger {
        CostLedger {
            templates: Vec::new(),
            unattached_actioned: vec![cost_line(Identifier::Pending(4), 1, 10, "Base", 1_000)],
            unattached_unchanged: vec![cost_line(Identifier::Persisted(2), 2, 10, "Base", 500)],
            unchanged_templates: vec![template(
                Identifier::Persisted(9),
                vec![
                    cost_line(Identifier::Persisted(3), 1, 11, "", 200),
                    cost_line(Identifier::Persisted(5), 1, 12, "", 100),
                ],
            )],
            removed: Vec::new(),
        }
    }

    #[test]
    fn test_active_costs_and_locations() {
        let ledger = sample_ledger();
        let active = ledger.active_costs();

        assert_eq!(active.len(), 4);
        assert_eq!(ledger.cost_count(), 4);
        assert_eq!(active[0].location, CostLocation::Template(Identifier::Persisted(9)));
        assert_eq!(active[3].location, CostLocation::Unattached);
        assert_eq!(ledger.max_pending_token(), 4);
    }

    #[test]
    fn test_find_line_by_key() {
        let ledger = sample_ledger();
        let found = ledger.find_line(&CostKey::new(2, 10, "Base")).unwrap();
        assert_eq!(found.id, Identifier::Persisted(2));
        assert!(ledger.find_line(&CostKey::new(2, 10, "Other")).is_none());
    }

    #[test]
    fn test_counterpart_follows_lineage_not_key() {
        let mut monthly = cost_line(Identifier::Pending(1), 1, 10, "Base", 1_100).reversioned(Identifier::Pending(8), true);
        let mut quarterly = monthly.clone();
        quarterly.id = Identifier::Pending(9);
        quarterly.source_id = Some(Identifier::Pending(2));
        quarterly.payment_pattern = PaymentPattern::Quarters;
        let ledger = CostLedger {
            unattached_actioned: vec![monthly, quarterly.clone()],
            ..CostLedger::default()
        };

        let mut fresh = quarterly.clone();
        fresh.payment_pattern = PaymentPattern::Months;
        let found = ledger.find_counterpart(&fresh).unwrap();
        assert_eq!(found.id, Identifier::Pending(9));
        assert_eq!(found.payment_pattern, PaymentPattern::Quarters);

        let mut added = cost_line(Identifier::Pending(9), 1, 10, "Base", 50);
        added.actioned = true;
        assert!(ledger.find_counterpart(&added).is_none());
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let mut ledger = sample_ledger();
        assert!(ledger.validate().is_ok());

        let dup = ledger.unattached_unchanged[0].clone();
        ledger.removed.push(dup);
        assert!(matches!(ledger.validate(), Err(ReviewError::CorruptedSnapshot { .. })));
    }

    #[test]
    fn test_validate_detects_empty_template() {
        let mut ledger = sample_ledger();
        ledger.unchanged_templates[0].costs.clear();
        assert!(matches!(ledger.validate(), Err(ReviewError::CorruptedSnapshot { .. })));
    }
}
