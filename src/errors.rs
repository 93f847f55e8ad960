use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{AssetId, CategoryId, CostKey, CpiRegionId, Identifier, ReviewToken, ReviewType};

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("no term exists on the contract; add the initial term before creating reviews")]
    NoInitialTerm,

    #[error("invalid term chain: {message}")]
    InvalidTermChain {
        message: String,
    },

    #[error("no actioned review precedes {date} (priority {priority})")]
    NoCommencingReview {
        date: NaiveDate,
        priority: i32,
    },

    #[error("review {token} cannot be actioned before the commencing review")]
    MissingCommencingReview {
        token: ReviewToken,
    },

    #[error("review {token} falls on the contract start {date}, which is reserved for the commencing review")]
    ReviewStartEqualsContractStart {
        token: ReviewToken,
        date: NaiveDate,
    },

    #[error("review {token} on {date} is before the contract start {contract_start}")]
    ReviewBeforeContractStart {
        token: ReviewToken,
        date: NaiveDate,
        contract_start: NaiveDate,
    },

    #[error("cannot edit review {token}: {reason}")]
    OutOfOrderEdit {
        token: ReviewToken,
        reason: String,
    },

    #[error("cannot action review {token}: {reason}")]
    OutOfOrderAction {
        token: ReviewToken,
        reason: String,
    },

    #[error("review {token} on {date} is after the last exercised term ending {term_end} and the contract is not in holdover")]
    OutsideExercisedTerm {
        token: ReviewToken,
        date: NaiveDate,
        term_end: NaiveDate,
    },

    #[error("review {token} has not been actioned")]
    NotActioned {
        token: ReviewToken,
    },

    #[error("review not found: {token}")]
    ReviewNotFound {
        token: ReviewToken,
    },

    #[error("{review_type} review {token} targets {key}, which matches no current cost line")]
    UnmatchedReviewTarget {
        token: ReviewToken,
        review_type: ReviewType,
        key: CostKey,
    },

    #[error("template {template_id} is not part of the previous actioned snapshot")]
    TemplateNotFound {
        template_id: Identifier,
    },

    #[error("cost line {id} is not offered for selection")]
    CostLineNotFound {
        id: Identifier,
    },

    #[error("raw identifier {raw} is out of range")]
    InvalidIdentifier {
        raw: i64,
    },

    #[error("contract not found: {contract_id}")]
    ContractNotFound {
        contract_id: u64,
    },

    #[error("unknown cost category: {category_id}")]
    UnknownCostCategory {
        category_id: CategoryId,
    },

    #[error("unknown cpi region: {region_id}")]
    UnknownCpiRegion {
        region_id: CpiRegionId,
    },

    #[error("asset {asset_id} is not editable")]
    AssetNotEditable {
        asset_id: AssetId,
    },

    #[error("invalid payment frequency {frequency} for {key}")]
    InvalidFrequency {
        key: CostKey,
        frequency: u32,
    },

    #[error("concurrent modification: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        expected: u64,
        actual: u64,
    },

    #[error("corrupted snapshot: {message}")]
    CorruptedSnapshot {
        message: String,
    },

    #[error("missing reference data: {message}")]
    MissingReferenceData {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReviewError {
    /// whether the caller can resubmit corrected input
    pub fn is_rejected_input(&self) -> bool {
        !matches!(
            self,
            ReviewError::CorruptedSnapshot { .. }
                | ReviewError::MissingReferenceData { .. }
                | ReviewError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
