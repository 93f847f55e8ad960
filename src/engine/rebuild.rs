use crate::decimal::Money;
use crate::engine::partition::{Partition, PartitionReport};
use crate::engine::Actioning;
use crate::errors::{ReviewError, Result};
use crate::events::Event;
use crate::ledger::{CostLedger, CostLine, RecurringTemplate};
use crate::rates::RateInstruction;
use crate::timeline::{CostDraft, ReviewTarget, TargetChange};
use crate::types::{Identifier, ReviewType};

/// ledger produced for a non-commencing review
pub(crate) struct Rebuilt {
    pub ledger: CostLedger,
    pub partition: PartitionReport,
    pub retired: Vec<Identifier>,
}

impl Actioning<'_> {
    /// derive the new ledger from the prior one
    ///
    /// Targeted lines are re-priced, their template siblings move with them
    /// onto a rebuilt template, and everything else is carried over.
    pub(super) fn rebuild(
        &mut self,
        prior: &CostLedger,
        targets: &[ReviewTarget],
        additions: &[(&CostDraft, Option<Identifier>)],
    ) -> Result<Rebuilt> {
        let joined: Vec<Identifier> = additions.iter().filter_map(|(_, template_id)| *template_id).collect();
        if let Some(missing) = joined.iter().find(|id| prior.template(**id).is_none()) {
            return Err(ReviewError::TemplateNotFound { template_id: *missing });
        }

        let partition = Partition::of(prior, targets, self.review_type, &joined);
        self.check_targets(&partition)?;
        tracing::debug!(
            token = self.token,
            directly_affected = partition.directly_affected.len(),
            co_template = partition.co_template.len(),
            unchanged = partition.unchanged.len(),
            "partitioned prior costs"
        );

        let mut ledger = CostLedger::new();

        for template in prior.all_templates() {
            if !partition.affected_templates.contains(&template.template_id) {
                ledger.unchanged_templates.push(self.carry_template(template));
                continue;
            }
            let first_invoice_date = self.align(template.first_invoice_date, template.frequency, template.pattern);
            let mut revision = template.revision(self.ids.mint(), first_invoice_date);
            for cost in &template.costs {
                match partition.target_for(cost.id).map(|t| &t.change) {
                    Some(TargetChange::Remove) => self.remove(&mut ledger, cost),
                    Some(TargetChange::Reprice(instruction)) => {
                        let line = self.reprice(cost, instruction);
                        revision.costs.push(line);
                    }
                    None => {
                        let line = self.move_sibling(cost);
                        revision.costs.push(line);
                    }
                }
            }
            ledger.templates.push(revision);
        }

        for cost in prior.unattached_actioned.iter().chain(&prior.unattached_unchanged) {
            match partition.target_for(cost.id).map(|t| &t.change) {
                Some(TargetChange::Remove) => self.remove(&mut ledger, cost),
                Some(TargetChange::Reprice(instruction)) => {
                    let line = self.reprice(cost, instruction);
                    ledger.unattached_actioned.push(line);
                }
                None => ledger.unattached_unchanged.push(cost.carried_forward()),
            }
        }

        self.place_additions(&mut ledger, additions)?;
        let retired = self.retire_empty_templates(&mut ledger);

        Ok(Rebuilt {
            ledger,
            partition: partition.report(),
            retired,
        })
    }

    fn check_targets(&self, partition: &Partition<'_>) -> Result<()> {
        if let Some(target) = partition.unmatched.first() {
            if self.config.require_target_match {
                return Err(ReviewError::UnmatchedReviewTarget {
                    token: self.token.to_string(),
                    review_type: self.review_type,
                    key: target.key.clone(),
                });
            }
            for target in &partition.unmatched {
                tracing::warn!(token = self.token, key = %target.key, "review target matches no cost line, skipping");
            }
        }

        for cost in &partition.directly_affected {
            if !self.collaborators.assets.is_editable(cost.line.asset_id) {
                return Err(ReviewError::AssetNotEditable {
                    asset_id: cost.line.asset_id,
                });
            }
            if let Some(target) = partition.target_for(cost.line.id) {
                if let TargetChange::Reprice(RateInstruction::Amend {
                    frequency: Some(0), ..
                }) = &target.change
                {
                    return Err(ReviewError::InvalidFrequency {
                        key: cost.line.key(),
                        frequency: 0,
                    });
                }
            }
        }
        Ok(())
    }

    /// unaffected template, with header fields refreshed from the invoice store
    fn carry_template(&self, template: &RecurringTemplate) -> RecurringTemplate {
        let carried = template.carried_forward();
        match template
            .template_id
            .persisted_id()
            .and_then(|id| self.collaborators.templates.template(id))
        {
            Some(header) => carried.with_header(header),
            None => carried,
        }
    }

    fn reprice(&mut self, cost: &CostLine, instruction: &RateInstruction) -> CostLine {
        let next = cost.reversioned(self.ids.mint(), true);
        let mut next = self.rates.apply(&next, instruction, self.effective_date);
        next.first_payment_date = self.align(next.first_payment_date, next.payment_frequency, next.payment_pattern);
        self.finish_actioned(next)
    }

    /// untargeted line on a rebuilt template: same amounts, realigned date
    fn move_sibling(&mut self, cost: &CostLine) -> CostLine {
        let mut next = cost.reversioned(self.ids.mint(), false);
        next.first_payment_date = self.align(next.first_payment_date, next.payment_frequency, next.payment_pattern);
        next
    }

    fn remove(&mut self, ledger: &mut CostLedger, cost: &CostLine) {
        self.events.emit(Event::CostLineRemoved {
            token: self.token.to_string(),
            key: cost.key(),
            amount: cost.payment_amount,
        });
        ledger.removed.push(cost.carried_forward());
    }

    /// add new lines, joining rebuilt templates or grouping into new ones
    pub(super) fn place_additions(
        &mut self,
        ledger: &mut CostLedger,
        additions: &[(&CostDraft, Option<Identifier>)],
    ) -> Result<()> {
        let mut groups: Vec<(String, &CostDraft, Vec<CostLine>)> = Vec::new();

        for (draft, template_id) in additions {
            let line = self.line_from_draft(draft)?;
            match (template_id, &draft.template_group) {
                (Some(id), _) => {
                    let template = ledger
                        .templates
                        .iter_mut()
                        .find(|t| t.source_id == Some(*id))
                        .ok_or(ReviewError::TemplateNotFound { template_id: *id })?;
                    template.costs.push(line);
                }
                (None, Some(group)) => match groups.iter_mut().find(|(name, _, _)| name == group) {
                    Some((_, _, costs)) => costs.push(line),
                    None => groups.push((group.clone(), *draft, vec![line])),
                },
                (None, None) => ledger.unattached_actioned.push(line),
            }
        }

        for (group, first, costs) in groups {
            let first_invoice_date = costs
                .iter()
                .map(|c| c.first_payment_date)
                .min()
                .unwrap_or(self.effective_date);
            let vendor_id = additions
                .iter()
                .filter(|(d, _)| d.template_group.as_deref() == Some(group.as_str()))
                .find_map(|(d, _)| d.vendor_id);
            ledger.templates.push(RecurringTemplate {
                template_id: self.ids.mint(),
                source_id: None,
                first_invoice_date,
                frequency: first.payment_frequency,
                pattern: first.payment_pattern,
                invoice_group: Some(group),
                vendor_id,
                costs,
            });
        }
        Ok(())
    }

    fn line_from_draft(&mut self, draft: &CostDraft) -> Result<CostLine> {
        if draft.payment_frequency == 0 {
            return Err(ReviewError::InvalidFrequency {
                key: draft.key(),
                frequency: 0,
            });
        }
        if self.collaborators.categories.category(draft.category_id).is_none() {
            return Err(ReviewError::UnknownCostCategory {
                category_id: draft.category_id,
            });
        }
        if !self.collaborators.assets.is_editable(draft.asset_id) {
            return Err(ReviewError::AssetNotEditable {
                asset_id: draft.asset_id,
            });
        }
        let tax_jurisdiction = match &draft.tax_jurisdiction {
            Some(code) => code.clone(),
            None => self.default_jurisdiction(draft.asset_id)?,
        };
        let default_date = if self.review_type == ReviewType::Commencing {
            self.contract_start
        } else {
            self.effective_date
        };

        let mut line = CostLine {
            id: self.ids.mint(),
            source_id: None,
            asset_id: draft.asset_id,
            category_id: draft.category_id,
            label: draft.label.clone(),
            payment_amount: draft.payment_amount,
            yearly_amount: draft.payment_amount,
            payment_frequency: draft.payment_frequency,
            payment_pattern: draft.payment_pattern,
            first_payment_date: draft.first_payment_date.unwrap_or(default_date),
            tax_jurisdiction,
            tax_rate_id: draft.tax_rate_id,
            tax_amount: Money::ZERO,
            actioned: true,
            previous: None,
        };
        self.rates.refresh_derived(&mut line, self.effective_date);
        Ok(self.finish_actioned(line))
    }

    /// drop rebuilt templates whose lines were all removed
    fn retire_empty_templates(&mut self, ledger: &mut CostLedger) -> Vec<Identifier> {
        let mut retired = Vec::new();
        let mut kept = Vec::new();

        for template in std::mem::take(&mut ledger.templates) {
            if template.costs.is_empty() {
                let template_id = template.source_id.unwrap_or(template.template_id);
                self.events.emit(Event::TemplateRetired {
                    token: self.token.to_string(),
                    template_id,
                });
                tracing::info!(token = self.token, %template_id, "retired template with no remaining costs");
                retired.push(template_id);
                continue;
            }
            if let Some(source_id) = template.source_id {
                tracing::debug!(token = self.token, %source_id, new_id = %template.template_id, "rebuilt template");
                self.events.emit(Event::TemplateRebuilt {
                    token: self.token.to_string(),
                    source_id,
                    new_id: template.template_id,
                    first_invoice_date: template.first_invoice_date,
                    cost_count: template.costs.len(),
                });
            }
            kept.push(template);
        }

        ledger.templates = kept;
        retired
    }
}
