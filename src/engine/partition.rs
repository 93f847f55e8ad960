use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::ledger::{CostLedger, CostLocation, LocatedCost};
use crate::timeline::ReviewTarget;
use crate::types::{Identifier, ReviewType};

/// prior cost lines split by how the review touches them
///
/// Every active line of the prior ledger lands in exactly one set.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    /// lines a review target matches (set 1)
    pub directly_affected: Vec<LocatedCost<'a>>,
    /// untargeted lines on a template that gets rebuilt (set 2)
    pub co_template: Vec<LocatedCost<'a>>,
    /// everything else (set 3)
    pub unchanged: Vec<LocatedCost<'a>>,
    /// prior templates that get rebuilt, in ledger order
    pub affected_templates: Vec<Identifier>,
    /// targets that matched no line
    pub unmatched: Vec<&'a ReviewTarget>,
    targets_by_line: HashMap<Identifier, &'a ReviewTarget>,
}

impl<'a> Partition<'a> {
    /// partition a ledger against review targets
    ///
    /// A line matched by several targets takes the first one. Templates in
    /// `joined_templates` are rebuilt even without a targeted line, because
    /// the review adds a line to them.
    pub fn of(
        ledger: &'a CostLedger,
        targets: &'a [ReviewTarget],
        review_type: ReviewType,
        joined_templates: &[Identifier],
    ) -> Self {
        let active = ledger.active_costs();

        let mut targets_by_line = HashMap::new();
        for cost in &active {
            let key = cost.line.key();
            if let Some(target) = targets.iter().find(|t| t.key.matches(&key, review_type)) {
                targets_by_line.insert(cost.line.id, target);
            }
        }

        let unmatched = targets
            .iter()
            .filter(|t| !active.iter().any(|c| t.key.matches(&c.line.key(), review_type)))
            .collect();

        let touched: HashSet<Identifier> = active
            .iter()
            .filter(|c| targets_by_line.contains_key(&c.line.id))
            .filter_map(|c| match c.location {
                CostLocation::Template(id) => Some(id),
                CostLocation::Unattached => None,
            })
            .chain(joined_templates.iter().copied())
            .collect();
        let affected_templates: Vec<Identifier> = ledger
            .all_templates()
            .map(|t| t.template_id)
            .filter(|id| touched.contains(id))
            .collect();

        let mut partition = Partition {
            directly_affected: Vec::new(),
            co_template: Vec::new(),
            unchanged: Vec::new(),
            affected_templates,
            unmatched,
            targets_by_line,
        };
        for cost in active {
            if partition.targets_by_line.contains_key(&cost.line.id) {
                partition.directly_affected.push(cost);
            } else if partition.is_rebuilt(cost.location) {
                partition.co_template.push(cost);
            } else {
                partition.unchanged.push(cost);
            }
        }
        partition
    }

    /// target that put a line into set 1
    pub fn target_for(&self, line_id: Identifier) -> Option<&'a ReviewTarget> {
        self.targets_by_line.get(&line_id).copied()
    }

    pub fn is_rebuilt(&self, location: CostLocation) -> bool {
        match location {
            CostLocation::Template(id) => self.affected_templates.contains(&id),
            CostLocation::Unattached => false,
        }
    }

    pub fn report(&self) -> PartitionReport {
        let ids = |costs: &[LocatedCost<'_>]| costs.iter().map(|c| c.line.id).collect();
        PartitionReport {
            directly_affected: ids(&self.directly_affected),
            co_template: ids(&self.co_template),
            unchanged: ids(&self.unchanged),
        }
    }
}

/// prior line ids per partition set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub directly_affected: Vec<Identifier>,
    pub co_template: Vec<Identifier>,
    pub unchanged: Vec<Identifier>,
}

impl PartitionReport {
    pub fn total(&self) -> usize {
        self.directly_affected.len() + self.co_template.len() + self.unchanged.len()
    }
}
