use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{ReviewError, Result};
use crate::types::{AssetId, ReviewToken, ReviewType, TermState};

/// contiguous period of the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub is_option: bool,
    pub state: TermState,
}

impl Term {
    /// initial, non-option term
    pub fn initial(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end,
            is_option: false,
            state: TermState::Exercised,
        }
    }

    /// option term, pending until exercised
    pub fn option(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end,
            is_option: true,
            state: TermState::Pending,
        }
    }

    pub fn exercised(mut self) -> Self {
        self.state = TermState::Exercised;
        self
    }

    /// non-option terms are in force without being exercised
    pub fn is_in_force(&self) -> bool {
        !self.is_option || self.state == TermState::Exercised
    }
}

/// the slice of a lease contract the review engine needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: u64,
    pub terms: Vec<Term>,
    /// tenant holding over past the last exercised term
    pub holdover: bool,
    pub primary_asset: AssetId,
    /// sub-contracted or scheduled assets, replacing the primary asset in scope when present
    pub scheduled_assets: Vec<AssetId>,
}

impl Contract {
    pub fn new(contract_id: u64, primary_asset: AssetId, terms: Vec<Term>) -> Self {
        Self {
            contract_id,
            terms,
            holdover: false,
            primary_asset,
            scheduled_assets: Vec::new(),
        }
    }

    /// check the terms form one gap-free chain
    pub fn validate_terms(&self) -> Result<()> {
        let first = self.first_term()?;
        if first.is_option {
            return Err(ReviewError::InvalidTermChain {
                message: "the first term cannot be an option".to_string(),
            });
        }

        for pair in self.terms.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let prev_end = prev.end.ok_or_else(|| ReviewError::InvalidTermChain {
                message: format!("term starting {} is open-ended but is followed by another term", prev.start),
            })?;
            if prev_end < prev.start {
                return Err(ReviewError::InvalidTermChain {
                    message: format!("term starting {} ends before it starts", prev.start),
                });
            }
            if prev_end.succ_opt() != Some(next.start) {
                return Err(ReviewError::InvalidTermChain {
                    message: format!(
                        "term starting {} must start the day after {}",
                        next.start, prev_end
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn first_term(&self) -> Result<&Term> {
        self.terms.first().ok_or(ReviewError::NoInitialTerm)
    }

    pub fn contract_start(&self) -> Result<NaiveDate> {
        Ok(self.first_term()?.start)
    }

    /// end of the last term in force; `None` when that term is open-ended
    pub fn last_exercised_end(&self) -> Result<Option<NaiveDate>> {
        let mut end = self.first_term()?.end;
        for term in self.terms.iter().skip(1) {
            if !term.is_in_force() {
                break;
            }
            end = term.end;
        }
        Ok(end)
    }

    /// assets that receive bootstrap cost lines
    pub fn assets_in_scope(&self) -> Vec<AssetId> {
        if self.scheduled_assets.is_empty() {
            vec![self.primary_asset]
        } else {
            self.scheduled_assets.clone()
        }
    }

    /// check a review date against the term chain
    pub fn validate_review_date(
        &self,
        token: &ReviewToken,
        review_type: ReviewType,
        date: NaiveDate,
    ) -> Result<()> {
        let contract_start = self.contract_start()?;

        if review_type != ReviewType::Commencing {
            if date < contract_start {
                return Err(ReviewError::ReviewBeforeContractStart {
                    token: token.clone(),
                    date,
                    contract_start,
                });
            }
            if date == contract_start {
                return Err(ReviewError::ReviewStartEqualsContractStart {
                    token: token.clone(),
                    date,
                });
            }
        }

        if let Some(term_end) = self.last_exercised_end()? {
            if date > term_end && !self.holdover {
                return Err(ReviewError::OutsideExercisedTerm {
                    token: token.clone(),
                    date,
                    term_end,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_term_contract() -> Contract {
        Contract::new(
            1,
            100,
            vec![
                Term::initial(date(2024, 1, 1), Some(date(2024, 12, 31))),
                Term::option(date(2025, 1, 1), Some(date(2025, 12, 31))),
            ],
        )
    }

    #[test]
    fn test_valid_chain() {
        assert!(two_term_contract().validate_terms().is_ok());
    }

    #[test]
    fn test_no_terms() {
        let contract = Contract::new(1, 100, Vec::new());
        assert!(matches!(contract.validate_terms(), Err(ReviewError::NoInitialTerm)));
        assert!(matches!(contract.contract_start(), Err(ReviewError::NoInitialTerm)));
    }

    #[test]
    fn test_gap_in_chain() {
        let contract = Contract::new(
            1,
            100,
            vec![
                Term::initial(date(2024, 1, 1), Some(date(2024, 12, 31))),
                Term::option(date(2025, 2, 1), None),
            ],
        );
        assert!(matches!(contract.validate_terms(), Err(ReviewError::InvalidTermChain { .. })));
    }

    #[test]
    fn test_first_term_option() {
        let contract = Contract::new(1, 100, vec![Term::option(date(2024, 1, 1), None)]);
        assert!(matches!(contract.validate_terms(), Err(ReviewError::InvalidTermChain { .. })));
    }

    #[test]
    fn test_exercised_end_follows_options() {
        let mut contract = two_term_contract();
        assert_eq!(contract.last_exercised_end().unwrap(), Some(date(2024, 12, 31)));

        contract.terms[1] = contract.terms[1].clone().exercised();
        assert_eq!(contract.last_exercised_end().unwrap(), Some(date(2025, 12, 31)));
    }

    #[test]
    fn test_review_date_rules() {
        let mut contract = two_term_contract();
        let token = "r1".to_string();

        assert!(matches!(
            contract.validate_review_date(&token, ReviewType::Fixed, date(2024, 1, 1)),
            Err(ReviewError::ReviewStartEqualsContractStart { .. })
        ));
        assert!(matches!(
            contract.validate_review_date(&token, ReviewType::Fixed, date(2023, 6, 1)),
            Err(ReviewError::ReviewBeforeContractStart { .. })
        ));
        assert!(matches!(
            contract.validate_review_date(&token, ReviewType::Market, date(2025, 6, 1)),
            Err(ReviewError::OutsideExercisedTerm { .. })
        ));
        assert!(contract
            .validate_review_date(&token, ReviewType::Commencing, date(2024, 1, 1))
            .is_ok());
        assert!(contract
            .validate_review_date(&token, ReviewType::Fixed, date(2024, 7, 1))
            .is_ok());

        contract.holdover = true;
        assert!(contract
            .validate_review_date(&token, ReviewType::Market, date(2025, 6, 1))
            .is_ok());
    }

    #[test]
    fn test_assets_in_scope() {
        let mut contract = two_term_contract();
        assert_eq!(contract.assets_in_scope(), vec![100]);

        contract.scheduled_assets = vec![201, 202];
        assert_eq!(contract.assets_in_scope(), vec![201, 202]);
    }
}
