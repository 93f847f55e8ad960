use serde::{Deserialize, Serialize};

use crate::errors::{ReviewError, Result};
use crate::types::{CategoryId, PaymentPattern, ReviewToken};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// reserved token of the commencing review
    pub commencing_token: ReviewToken,
    /// category of synthesized bootstrap cost lines
    pub default_category_id: CategoryId,
    /// billing pattern for synthesized bootstrap cost lines
    pub default_payment_pattern: PaymentPattern,
    /// billing frequency for synthesized bootstrap cost lines
    pub default_payment_frequency: u32,
    /// reject review targets that match no prior cost line
    pub require_target_match: bool,
    /// snap month-end lease starts to month-end payment dates
    pub snap_month_end: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// create standard configuration
    pub fn standard() -> Self {
        Self {
            commencing_token: "costs".to_string(),
            default_category_id: 0,
            default_payment_pattern: PaymentPattern::Months,
            default_payment_frequency: 1,
            require_target_match: true,
            snap_month_end: true,
        }
    }

    /// create lenient configuration, unmatched targets are skipped
    pub fn lenient() -> Self {
        Self {
            require_target_match: false,
            ..Self::standard()
        }
    }

    /// load from json, missing fields take standard values
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.commencing_token.trim().is_empty() {
            return Err(ReviewError::InvalidConfiguration {
                message: "commencing token cannot be empty".to_string(),
            });
        }
        if self.default_payment_frequency == 0 {
            return Err(ReviewError::InvalidConfiguration {
                message: "default payment frequency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
