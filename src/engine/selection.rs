use chrono::NaiveDate;
use serde::Serialize;

use crate::contract::Contract;
use crate::engine::ReviewActioningEngine;
use crate::errors::{ReviewError, Result};
use crate::ledger::{CostLine, CostLocation, IdAllocator, RecurringTemplate, TemplateHeader};
use crate::providers::Collaborators;
use crate::timeline::ReviewTimeline;
use crate::types::{CostKey, Identifier, PaymentPattern, ReviewType};

/// a prior cost line offered for carrying into a new review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionCandidate {
    pub line: CostLine,
    pub template_id: Option<Identifier>,
    pub template_header: Option<TemplateHeader>,
    pub asset_name: Option<String>,
    pub category_name: Option<String>,
    pub category_group: Option<String>,
    /// the key a review of the requested type would match on
    pub match_key: CostKey,
}

/// candidates from the snapshot nearest before a review date
#[derive(Debug, Clone)]
pub struct CostSelection {
    pub review_date: NaiveDate,
    pub review_type: ReviewType,
    pub source_effective_date: NaiveDate,
    pub source_priority: i32,
    pub candidates: Vec<SelectionCandidate>,
    ids: IdAllocator,
}

/// selected lines detached from their source snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedCosts {
    /// lines selected together from one template, on a new revision of it
    pub templates: Vec<RecurringTemplate>,
    pub unattached: Vec<CostLine>,
}

impl SelectedCosts {
    pub fn lines(&self) -> impl Iterator<Item = &CostLine> {
        self.templates
            .iter()
            .flat_map(|t| t.costs.iter())
            .chain(self.unattached.iter())
    }

    /// distinct keys as a review of `review_type` would target them
    pub fn target_keys(&self, review_type: ReviewType) -> Vec<CostKey> {
        let mut keys: Vec<CostKey> = Vec::new();
        for line in self.lines() {
            let key = match_key(line, review_type);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

fn match_key(line: &CostLine, review_type: ReviewType) -> CostKey {
    if review_type.matches_on_label() {
        line.key()
    } else {
        CostKey::new(line.asset_id, line.category_id, "")
    }
}

impl ReviewActioningEngine {
    /// list the active lines of the snapshot nearest on/before `review_date`
    pub fn selection_candidates(
        &self,
        timeline: &ReviewTimeline,
        review_date: NaiveDate,
        review_type: ReviewType,
        collaborators: Collaborators<'_>,
    ) -> Result<CostSelection> {
        let source = timeline.snapshot_before(review_date, i32::MAX)?;

        let candidates = source
            .ledger
            .active_costs()
            .into_iter()
            .map(|cost| {
                let template = match cost.location {
                    CostLocation::Template(id) => source.ledger.template(id),
                    CostLocation::Unattached => None,
                };
                let category = collaborators.categories.category(cost.line.category_id);
                SelectionCandidate {
                    line: cost.line.clone(),
                    template_id: template.map(|t| t.template_id),
                    template_header: template.map(RecurringTemplate::header),
                    asset_name: collaborators.assets.asset_name(cost.line.asset_id),
                    category_name: category.as_ref().map(|c| c.display_name.clone()),
                    category_group: category.map(|c| c.group),
                    match_key: match_key(cost.line, review_type),
                }
            })
            .collect();

        Ok(CostSelection {
            review_date,
            review_type,
            source_effective_date: source.effective_date,
            source_priority: source.priority,
            candidates,
            ids: IdAllocator::past(
                timeline
                    .reviews()
                    .iter()
                    .flat_map(|r| r.actioned_snapshot.iter().chain(r.prior_actioned_snapshot.iter()))
                    .map(|s| &s.ledger),
            ),
        })
    }

    /// detach the chosen lines and align them to the review date
    ///
    /// Lines chosen together from one template move onto a new revision of
    /// that template. A line chosen alone becomes unattached.
    pub fn confirm_selection(
        &self,
        selection: &CostSelection,
        selected: &[Identifier],
        contract: &Contract,
    ) -> Result<SelectedCosts> {
        let contract_start = contract.contract_start()?;
        let mut ids = selection.ids.clone();
        let align = |date: NaiveDate, frequency: u32, pattern: PaymentPattern| {
            self.proration
                .align_first_payment(contract_start, date, selection.review_date, frequency, pattern)
        };

        let mut chosen: Vec<&SelectionCandidate> = Vec::new();
        for id in selected {
            let candidate = selection
                .candidates
                .iter()
                .find(|c| c.line.id == *id)
                .ok_or(ReviewError::CostLineNotFound { id: *id })?;
            if !chosen.iter().any(|c| c.line.id == *id) {
                chosen.push(candidate);
            }
        }

        let mut result = SelectedCosts::default();
        let mut handled: Vec<Identifier> = Vec::new();
        for candidate in &chosen {
            if handled.contains(&candidate.line.id) {
                continue;
            }
            let siblings: Vec<&SelectionCandidate> = match candidate.template_id {
                Some(template_id) => chosen
                    .iter()
                    .filter(|c| c.template_id == Some(template_id))
                    .copied()
                    .collect(),
                None => vec![*candidate],
            };
            handled.extend(siblings.iter().map(|c| c.line.id));

            let detach = |c: &SelectionCandidate, ids: &mut IdAllocator| {
                let mut line = c.line.reversioned(ids.mint(), false);
                line.first_payment_date = align(line.first_payment_date, line.payment_frequency, line.payment_pattern);
                line
            };

            match (&candidate.template_header, candidate.template_id) {
                (Some(header), Some(template_id)) if siblings.len() > 1 => {
                    let template_new_id = ids.mint();
                    let costs = siblings.iter().map(|c| detach(c, &mut ids)).collect();
                    result.templates.push(RecurringTemplate {
                        template_id: template_new_id,
                        source_id: Some(template_id),
                        first_invoice_date: align(header.first_invoice_date, header.frequency, header.pattern),
                        frequency: header.frequency,
                        pattern: header.pattern,
                        invoice_group: header.invoice_group.clone(),
                        vendor_id: header.vendor_id,
                        costs,
                    });
                }
                _ => {
                    for c in siblings {
                        let line = detach(c, &mut ids);
                        result.unattached.push(line);
                    }
                }
            }
        }

        tracing::debug!(
            review_date = %selection.review_date,
            templates = result.templates.len(),
            unattached = result.unattached.len(),
            "confirmed cost selection"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::fixtures::{
        contract_2024, cost_line, date, reference_data, template, test_time, ASSET_A, RENT,
        UTILITIES,
    };
    use crate::ledger::{ActionedSnapshot, CostLedger};
    use crate::timeline::{Review, ReviewInstructions};

    fn timeline_with_prior() -> ReviewTimeline {
        let time = test_time();
        let ledger = CostLedger {
            unchanged_templates: vec![template(
                Identifier::Persisted(100),
                vec![
                    cost_line(Identifier::Persisted(1), ASSET_A, UTILITIES, "Power", 200),
                    cost_line(Identifier::Persisted(2), ASSET_A, RENT, "Base", 1_000),
                    cost_line(Identifier::Persisted(3), ASSET_A, UTILITIES, "Water", 50),
                ],
            )],
            unattached_unchanged: vec![cost_line(Identifier::Persisted(4), ASSET_A, RENT, "Parking", 80)],
            ..CostLedger::default()
        };
        let commencing = Review {
            actioned_snapshot: Some(ActionedSnapshot {
                effective_date: date(2024, 1, 1),
                priority: 0,
                actioned_date: time.now(),
                actioned_by: "ops".to_string(),
                cpi_region: None,
                ledger,
            }),
            ..Review::new("costs", date(2024, 1, 1), ReviewInstructions::Commencing { costs: Vec::new() })
        };
        ReviewTimeline::new("costs", vec![commencing])
    }

    #[test]
    fn test_candidates_carry_lookup_labels() {
        let data = reference_data();
        let engine = ReviewActioningEngine::new(EngineConfig::standard());
        let selection = engine
            .selection_candidates(
                &timeline_with_prior(),
                date(2024, 7, 1),
                ReviewType::Market,
                Collaborators::from_source(&data),
            )
            .unwrap();

        assert_eq!(selection.candidates.len(), 4);
        let first = &selection.candidates[0];
        assert_eq!(first.template_id, Some(Identifier::Persisted(100)));
        assert_eq!(first.category_name.as_deref(), Some("Utilities"));
        assert_eq!(first.asset_name.as_deref(), Some("Warehouse A"));
        assert_eq!(first.match_key, CostKey::new(ASSET_A, UTILITIES, ""));
    }

    #[test]
    fn test_confirm_groups_template_members() {
        let data = reference_data();
        let engine = ReviewActioningEngine::new(EngineConfig::standard());
        let selection = engine
            .selection_candidates(
                &timeline_with_prior(),
                date(2024, 7, 15),
                ReviewType::Fixed,
                Collaborators::from_source(&data),
            )
            .unwrap();

        let selected = engine
            .confirm_selection(
                &selection,
                &[Identifier::Persisted(1), Identifier::Persisted(3), Identifier::Persisted(4)],
                &contract_2024(),
            )
            .unwrap();

        assert_eq!(selected.templates.len(), 1);
        let rebuilt = &selected.templates[0];
        assert_eq!(rebuilt.source_id, Some(Identifier::Persisted(100)));
        assert_eq!(rebuilt.costs.len(), 2);
        assert_eq!(rebuilt.first_invoice_date, date(2024, 8, 1));
        assert!(rebuilt.costs.iter().all(|c| !c.id.is_persisted()));

        assert_eq!(selected.unattached.len(), 1);
        assert_eq!(selected.unattached[0].source_id, Some(Identifier::Persisted(4)));
        assert_eq!(selected.unattached[0].first_payment_date, date(2024, 8, 1));
        assert_eq!(selected.target_keys(ReviewType::Market).len(), 2);
    }

    #[test]
    fn test_single_template_member_is_unattached() {
        let data = reference_data();
        let engine = ReviewActioningEngine::new(EngineConfig::standard());
        let selection = engine
            .selection_candidates(
                &timeline_with_prior(),
                date(2024, 7, 1),
                ReviewType::Fixed,
                Collaborators::from_source(&data),
            )
            .unwrap();

        let selected = engine
            .confirm_selection(&selection, &[Identifier::Persisted(2)], &contract_2024())
            .unwrap();
        assert!(selected.templates.is_empty());
        assert_eq!(selected.unattached.len(), 1);

        let err = engine
            .confirm_selection(&selection, &[Identifier::Persisted(99)], &contract_2024())
            .unwrap_err();
        assert!(matches!(err, ReviewError::CostLineNotFound { .. }));
    }
}
