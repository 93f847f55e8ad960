mod bootstrap;
pub mod partition;
mod rebuild;
pub mod selection;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::contract::Contract;
use crate::errors::{ReviewError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{ActionedSnapshot, CostLedger, CostLine, IdAllocator};
use crate::proration::DateProrationCalculator;
use crate::providers::Collaborators;
use crate::rates::RateCalculator;
use crate::timeline::{Review, ReviewInstructions, ReviewTimeline};
use crate::types::{AssetId, Identifier, PaymentPattern, ReviewToken, ReviewType};

pub use partition::{Partition, PartitionReport};
pub use selection::{CostSelection, SelectedCosts, SelectionCandidate};

/// which review to action, as the caller sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub token: ReviewToken,
    pub review_type: ReviewType,
}

impl ActionRequest {
    pub fn new(token: impl Into<ReviewToken>, review_type: ReviewType) -> Self {
        Self {
            token: token.into(),
            review_type,
        }
    }
}

/// result of actioning one review
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// the input timeline with the review's new snapshot in place
    pub timeline: ReviewTimeline,
    pub snapshot: ActionedSnapshot,
    pub partition: PartitionReport,
    /// prior templates left without cost lines
    pub retired_templates: Vec<Identifier>,
    pub events: Vec<Event>,
}

/// turns a pending or editable review into a new actioned snapshot
pub struct ReviewActioningEngine {
    config: EngineConfig,
    proration: DateProrationCalculator,
}

impl Default for ReviewActioningEngine {
    fn default() -> Self {
        Self::new(EngineConfig::standard())
    }
}

impl ReviewActioningEngine {
    pub fn new(config: EngineConfig) -> Self {
        let proration = DateProrationCalculator::with_month_end_snapping(config.snap_month_end);
        Self { config, proration }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn proration(&self) -> &DateProrationCalculator {
        &self.proration
    }

    /// timeline whose commencing review uses the configured token
    pub fn timeline(&self, reviews: Vec<Review>) -> ReviewTimeline {
        ReviewTimeline::new(self.config.commencing_token.clone(), reviews)
    }

    /// action a review against the snapshot that precedes it
    ///
    /// Pure with respect to its inputs: the timeline is not modified and
    /// the same inputs and clock always produce the same snapshot.
    pub fn action(
        &self,
        timeline: &ReviewTimeline,
        contract: &Contract,
        request: &ActionRequest,
        collaborators: Collaborators<'_>,
        ctx: &RequestContext<'_>,
    ) -> Result<ActionOutcome> {
        contract.validate_terms()?;
        if timeline.commencing_token() != &self.config.commencing_token {
            return Err(ReviewError::InvalidConfiguration {
                message: format!(
                    "timeline reserves {:?} for the commencing review but the engine is configured for {:?}",
                    timeline.commencing_token(),
                    self.config.commencing_token
                ),
            });
        }
        let review = timeline.resolve(&request.token, request.review_type)?;
        let review_type = review.review_type();
        let contract_start = contract.contract_start()?;
        contract.validate_review_date(&review.token, review_type, review.review_date)?;

        let effective_date = if review_type == ReviewType::Commencing {
            contract_start
        } else {
            review.review_date
        };
        if review_type != ReviewType::Commencing && !timeline.commencing_actioned() {
            return Err(ReviewError::MissingCommencingReview {
                token: review.token.clone(),
            });
        }
        timeline.ensure_can_action(&review.token)?;

        let priority = match &review.actioned_snapshot {
            Some(snapshot) if snapshot.effective_date == effective_date => snapshot.priority,
            _ => timeline.next_priority(effective_date),
        };
        let cpi_region = resolve_cpi_region(&review.instructions, collaborators)?;

        let prior = if review_type == ReviewType::Commencing {
            None
        } else {
            let snapshot = timeline
                .snapshot_before(effective_date, priority)
                .map_err(|_| ReviewError::MissingCommencingReview {
                    token: review.token.clone(),
                })?;
            snapshot.ledger.validate()?;
            Some(snapshot)
        };

        tracing::debug!(
            token = %review.token,
            review_type = %review_type,
            %effective_date,
            priority,
            "actioning review"
        );

        let mut actioning = Actioning {
            token: &review.token,
            review_type,
            contract,
            contract_start,
            effective_date,
            config: &self.config,
            proration: self.proration,
            rates: RateCalculator::new(collaborators.tax_rates),
            collaborators,
            earlier: review.reference_snapshot().map(|s| &s.ledger),
            ids: IdAllocator::past(other_ledgers(timeline, &review.token)),
            events: EventStore::new(),
        };

        let additions = review.instructions.additions();
        let (ledger, partition, retired_templates) = match prior {
            None => (actioning.commencing_ledger(&additions)?, PartitionReport::default(), Vec::new()),
            Some(prior) => {
                let targets = review.instructions.targets();
                let rebuilt = actioning.rebuild(&prior.ledger, &targets, &additions)?;
                (rebuilt.ledger, rebuilt.partition, rebuilt.retired)
            }
        };
        ledger.validate()?;

        let snapshot = ActionedSnapshot {
            effective_date,
            priority,
            actioned_date: ctx.now(),
            actioned_by: ctx.user.clone(),
            cpi_region,
            ledger,
        };

        let actioned_costs = snapshot.ledger.actioned_count();
        let carried_costs = snapshot.ledger.cost_count() - actioned_costs;
        let removed_costs = snapshot.ledger.removed.len();
        let mut events = actioning.events;
        events.emit(Event::ReviewActioned {
            token: review.token.clone(),
            review_type,
            effective_date,
            priority,
            actioned_costs,
            carried_costs,
            removed_costs,
            actioned_by: ctx.user.clone(),
            timestamp: snapshot.actioned_date,
        });
        tracing::info!(
            token = %review.token,
            review_type = %review_type,
            %effective_date,
            priority,
            actioned_costs,
            carried_costs,
            removed_costs,
            "review actioned"
        );

        let mut updated = review.clone();
        updated.actioned_snapshot = Some(snapshot.clone());
        updated.prior_actioned_snapshot = None;

        Ok(ActionOutcome {
            timeline: timeline.with_review(updated)?,
            snapshot,
            partition,
            retired_templates,
            events: events.take_events(),
        })
    }
}

/// ledgers of every other review, actioned or discarded
///
/// Pending tokens are unique across the timeline until committed, so new
/// tokens start past all of them. The review's own snapshots are left out so
/// re-actioning mints the same tokens again.
fn other_ledgers<'t>(timeline: &'t ReviewTimeline, token: &'t str) -> impl Iterator<Item = &'t CostLedger> {
    timeline
        .reviews()
        .iter()
        .filter(move |r| r.token != token)
        .flat_map(|r| r.actioned_snapshot.iter().chain(r.prior_actioned_snapshot.iter()))
        .map(|s| &s.ledger)
}

fn resolve_cpi_region(
    instructions: &ReviewInstructions,
    collaborators: Collaborators<'_>,
) -> Result<Option<String>> {
    match instructions {
        ReviewInstructions::Cpi { region_id, .. } => collaborators
            .cpi_regions
            .regions()
            .into_iter()
            .find(|r| r.id == *region_id)
            .map(|r| Some(r.name))
            .ok_or(ReviewError::UnknownCpiRegion {
                region_id: *region_id,
            }),
        _ => Ok(None),
    }
}

/// state of one actioning computation
pub(crate) struct Actioning<'a> {
    token: &'a str,
    review_type: ReviewType,
    contract: &'a Contract,
    contract_start: NaiveDate,
    effective_date: NaiveDate,
    config: &'a EngineConfig,
    proration: DateProrationCalculator,
    rates: RateCalculator<'a>,
    collaborators: Collaborators<'a>,
    /// ledger of this review's own earlier actioning
    earlier: Option<&'a CostLedger>,
    ids: IdAllocator,
    events: EventStore,
}

impl Actioning<'_> {
    /// move a date onto the first payment on/after the effective date
    fn align(&self, date: NaiveDate, frequency: u32, pattern: PaymentPattern) -> NaiveDate {
        self.proration
            .align_first_payment(self.contract_start, date, self.effective_date, frequency, pattern)
    }

    fn default_jurisdiction(&self, asset_id: AssetId) -> Result<String> {
        self.collaborators
            .assets
            .default_jurisdiction(asset_id)
            .ok_or_else(|| ReviewError::MissingReferenceData {
                message: format!("asset {} has no default tax jurisdiction", asset_id),
            })
    }

    /// record an actioned line, re-applying the values of this review's
    /// earlier actioning when it priced the same line
    fn finish_actioned(&mut self, fresh: CostLine) -> CostLine {
        let line = match self.earlier.and_then(|ledger| ledger.find_counterpart(&fresh)) {
            Some(earlier) => self.rates.copy_from(&fresh, earlier),
            None => fresh,
        };
        self.events.emit(Event::CostLineActioned {
            token: self.token.to_string(),
            key: line.key(),
            old_amount: line.old_payment_amount(),
            new_amount: line.payment_amount,
            first_payment_date: line.first_payment_date,
        });
        line
    }
}
