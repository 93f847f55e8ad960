pub mod review;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{ReviewError, Result};
use crate::ledger::ActionedSnapshot;
use crate::types::{ReviewToken, ReviewType};

pub use review::{
    AdjustmentChange, CostDraft, EstimateItem, FixedItem, PercentItem, Review, ReviewInstructions,
    ReviewTarget, TargetChange,
};

/// the reviews of one contract with the ordering rules between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTimeline {
    commencing_token: ReviewToken,
    reviews: Vec<Review>,
}

impl ReviewTimeline {
    pub fn new(commencing_token: impl Into<ReviewToken>, reviews: Vec<Review>) -> Self {
        Self {
            commencing_token: commencing_token.into(),
            reviews,
        }
    }

    pub fn commencing_token(&self) -> &ReviewToken {
        &self.commencing_token
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn into_reviews(self) -> Vec<Review> {
        self.reviews
    }

    pub(crate) fn reviews_mut(&mut self) -> &mut [Review] {
        &mut self.reviews
    }

    pub fn get(&self, token: &str) -> Result<&Review> {
        self.reviews
            .iter()
            .find(|r| r.token == token)
            .ok_or_else(|| ReviewError::ReviewNotFound {
                token: token.to_string(),
            })
    }

    /// look up a review and check the caller's view of its type
    ///
    /// The reserved token must name a commencing review and vice versa, and
    /// the declared type must agree with the stored one.
    pub fn resolve(&self, token: &str, declared: ReviewType) -> Result<&Review> {
        let review = self.get(token)?;
        let is_reserved = token == self.commencing_token;
        let consistent = review.review_type() == declared
            && is_reserved == (declared == ReviewType::Commencing);

        if !consistent {
            tracing::warn!(
                token,
                declared = %declared,
                stored = %review.review_type(),
                "review token and type disagree"
            );
            return Err(ReviewError::ReviewNotFound {
                token: token.to_string(),
            });
        }
        Ok(review)
    }

    /// reviews in timeline order, pending ones by their own review date
    pub fn ordered_reviews(&self) -> Vec<&Review> {
        let mut ordered: Vec<&Review> = self.reviews.iter().collect();
        ordered.sort_by_key(|r| r.ordering_key());
        ordered
    }

    pub fn actioned_reviews(&self) -> Vec<&Review> {
        self.ordered_reviews()
            .into_iter()
            .filter(|r| r.is_actioned())
            .collect()
    }

    pub fn latest_actioned(&self) -> Option<&Review> {
        self.actioned_reviews().into_iter().last()
    }

    pub fn commencing_actioned(&self) -> bool {
        self.reviews
            .iter()
            .any(|r| r.token == self.commencing_token && r.is_actioned())
    }

    /// nearest actioned review strictly before `(date, priority)`
    pub fn last_actioned_before(&self, date: NaiveDate, priority: i32) -> Result<&Review> {
        self.actioned_reviews()
            .into_iter()
            .filter(|r| r.ordering_key() < (date, priority))
            .last()
            .ok_or(ReviewError::NoCommencingReview { date, priority })
    }

    /// snapshot of the nearest actioned review strictly before `(date, priority)`
    pub fn snapshot_before(&self, date: NaiveDate, priority: i32) -> Result<&ActionedSnapshot> {
        self.last_actioned_before(date, priority)?
            .actioned_snapshot
            .as_ref()
            .ok_or(ReviewError::NoCommencingReview { date, priority })
    }

    /// priority for a new actioning effective on `date`
    pub fn next_priority(&self, date: NaiveDate) -> i32 {
        self.reviews
            .iter()
            .filter_map(|r| r.actioned_snapshot.as_ref())
            .filter(|s| s.effective_date == date)
            .map(|s| s.priority + 1)
            .max()
            .unwrap_or(0)
    }

    /// whether an actioned review may be re-actioned or reverted
    ///
    /// Adjustments stay editable while nothing was actioned after them. Any
    /// other review is editable only while it is the latest actioned
    /// non-adjustment review, which for the commencing review means no
    /// scheduled review has been actioned yet.
    pub fn can_edit(&self, review: &Review) -> bool {
        let Some(snapshot) = &review.actioned_snapshot else {
            return false;
        };
        let others = self
            .reviews
            .iter()
            .filter(|r| r.token != review.token)
            .filter_map(|r| r.actioned_snapshot.as_ref().map(|s| (r.review_type(), s.key())));

        if review.review_type() == ReviewType::Adjustment {
            others.into_iter().all(|(_, key)| key <= snapshot.key())
        } else {
            others
                .filter(|(review_type, _)| *review_type != ReviewType::Adjustment)
                .all(|(_, key)| key < snapshot.key())
        }
    }

    /// check the review may be actioned now
    pub fn ensure_can_action(&self, token: &str) -> Result<()> {
        let review = self.get(token)?;

        if review.is_actioned() {
            if self.can_edit(review) {
                return Ok(());
            }
            return Err(ReviewError::OutOfOrderEdit {
                token: token.to_string(),
                reason: "a later review has already been actioned".to_string(),
            });
        }

        let latest = self.latest_actioned().map(|r| r.ordering_key());
        let first_pending = self
            .ordered_reviews()
            .into_iter()
            .filter(|r| !r.is_actioned() && r.review_type() != ReviewType::Adjustment)
            .find(|r| latest.map_or(true, |key| r.ordering_key() > key));

        match review.review_type() {
            ReviewType::Commencing => match latest {
                None => Ok(()),
                Some(_) => Err(ReviewError::OutOfOrderAction {
                    token: token.to_string(),
                    reason: "the commencing review must be actioned before any other review".to_string(),
                }),
            },
            ReviewType::Adjustment => match (latest, first_pending) {
                (Some((date, _)), _) if review.review_date < date => Err(ReviewError::OutOfOrderAction {
                    token: token.to_string(),
                    reason: format!("an adjustment cannot precede the review actioned on {}", date),
                }),
                (_, Some(next)) if next.ordering_key() < review.ordering_key() => {
                    Err(ReviewError::OutOfOrderAction {
                        token: token.to_string(),
                        reason: format!("review {} on {} must be actioned first", next.token, next.review_date),
                    })
                }
                _ => Ok(()),
            },
            _ => match first_pending {
                Some(next) if next.token == review.token => Ok(()),
                Some(next) => Err(ReviewError::OutOfOrderAction {
                    token: token.to_string(),
                    reason: format!("review {} on {} must be actioned first", next.token, next.review_date),
                }),
                None => Err(ReviewError::OutOfOrderAction {
                    token: token.to_string(),
                    reason: "a later review has already been actioned".to_string(),
                }),
            },
        }
    }

    /// copy of the timeline with one review replaced by token
    pub fn with_review(&self, review: Review) -> Result<ReviewTimeline> {
        let position = self
            .reviews
            .iter()
            .position(|r| r.token == review.token)
            .ok_or_else(|| ReviewError::ReviewNotFound {
                token: review.token.clone(),
            })?;
        let mut next = self.clone();
        next.reviews[position] = review;
        Ok(next)
    }
}
