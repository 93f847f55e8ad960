use crate::context::RequestContext;
use crate::errors::{ReviewError, Result};
use crate::events::{Event, EventStore};
use crate::timeline::ReviewTimeline;

/// result of reverting a review
#[derive(Debug, Clone)]
pub struct RevertOutcome {
    pub timeline: ReviewTimeline,
    pub events: Vec<Event>,
}

/// returns the latest actioned review to pending
///
/// The discarded snapshot is kept on the review, so re-actioning it with
/// unchanged instructions reproduces the same snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct RevertCoordinator;

impl RevertCoordinator {
    pub fn new() -> Self {
        Self
    }

    pub fn revert(&self, timeline: &ReviewTimeline, token: &str, ctx: &RequestContext<'_>) -> Result<RevertOutcome> {
        let review = timeline.get(token)?;
        let snapshot = review
            .actioned_snapshot
            .as_ref()
            .ok_or_else(|| ReviewError::NotActioned {
                token: token.to_string(),
            })?;

        if !timeline.can_edit(review) {
            return Err(ReviewError::OutOfOrderEdit {
                token: token.to_string(),
                reason: "only the last actioned review can be reverted".to_string(),
            });
        }

        let mut events = EventStore::new();
        events.emit(Event::ReviewReverted {
            token: token.to_string(),
            effective_date: snapshot.effective_date,
            priority: snapshot.priority,
            reverted_by: ctx.user.clone(),
            timestamp: ctx.now(),
        });
        tracing::info!(
            token,
            effective_date = %snapshot.effective_date,
            priority = snapshot.priority,
            "review reverted"
        );

        let mut reverted = review.clone();
        reverted.prior_actioned_snapshot = reverted.actioned_snapshot.take();

        Ok(RevertOutcome {
            timeline: timeline.with_review(reverted)?,
            events: events.take_events(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, test_time};
    use crate::ledger::{ActionedSnapshot, CostLedger};
    use crate::timeline::{Review, ReviewInstructions};
    use crate::types::ReviewState;

    fn actioned(token: &str, on: chrono::NaiveDate, instructions: ReviewInstructions) -> Review {
        let time = test_time();
        Review {
            actioned_snapshot: Some(ActionedSnapshot {
                effective_date: on,
                priority: 0,
                actioned_date: time.now(),
                actioned_by: "ops".to_string(),
                cpi_region: None,
                ledger: CostLedger::new(),
            }),
            ..Review::new(token, on, instructions)
        }
    }

    fn timeline() -> ReviewTimeline {
        ReviewTimeline::new(
            "costs",
            vec![
                actioned("costs", date(2024, 1, 1), ReviewInstructions::Commencing { costs: Vec::new() }),
                actioned("r1", date(2024, 6, 1), ReviewInstructions::Fixed { items: Vec::new() }),
                Review::new("r2", date(2024, 9, 1), ReviewInstructions::Fixed { items: Vec::new() }),
            ],
        )
    }

    #[test]
    fn test_revert_latest_keeps_prior_snapshot() {
        let time = test_time();
        let ctx = RequestContext::new("ops", &time);
        let outcome = RevertCoordinator::new().revert(&timeline(), "r1", &ctx).unwrap();

        let reverted = outcome.timeline.get("r1").unwrap();
        assert_eq!(reverted.state(), ReviewState::Pending);
        assert!(reverted.prior_actioned_snapshot.is_some());
        assert!(matches!(outcome.events[0], Event::ReviewReverted { .. }));
    }

    #[test]
    fn test_revert_rejections() {
        let time = test_time();
        let ctx = RequestContext::new("ops", &time);
        let coordinator = RevertCoordinator::new();

        assert!(matches!(
            coordinator.revert(&timeline(), "costs", &ctx),
            Err(ReviewError::OutOfOrderEdit { .. })
        ));
        assert!(matches!(
            coordinator.revert(&timeline(), "r2", &ctx),
            Err(ReviewError::NotActioned { .. })
        ));
        assert!(matches!(
            coordinator.revert(&timeline(), "zz", &ctx),
            Err(ReviewError::ReviewNotFound { .. })
        ));
    }
}
