use crate::decimal::Money;
use crate::engine::Actioning;
use crate::errors::Result;
use crate::ledger::{CostLedger, CostLine};
use crate::timeline::CostDraft;
use crate::types::{AssetId, Identifier};

impl Actioning<'_> {
    /// baseline ledger of the commencing review
    ///
    /// Submitted costs are used as given. Without any, each asset in scope
    /// gets one zero-amount default line so later reviews have something to
    /// match against.
    pub(super) fn commencing_ledger(&mut self, drafts: &[(&CostDraft, Option<Identifier>)]) -> Result<CostLedger> {
        let mut ledger = CostLedger::new();

        if drafts.is_empty() {
            for asset_id in self.contract.assets_in_scope() {
                let line = self.default_line(asset_id)?;
                ledger.unattached_actioned.push(line);
            }
            tracing::debug!(
                token = self.token,
                lines = ledger.unattached_actioned.len(),
                "synthesized default commencing costs"
            );
        } else {
            self.place_additions(&mut ledger, drafts)?;
        }

        Ok(ledger)
    }

    fn default_line(&mut self, asset_id: AssetId) -> Result<CostLine> {
        let mut line = CostLine {
            id: self.ids.mint(),
            source_id: None,
            asset_id,
            category_id: self.config.default_category_id,
            label: String::new(),
            payment_amount: Money::ZERO,
            yearly_amount: Money::ZERO,
            payment_frequency: self.config.default_payment_frequency,
            payment_pattern: self.config.default_payment_pattern,
            first_payment_date: self.contract_start,
            tax_jurisdiction: self.default_jurisdiction(asset_id)?,
            tax_rate_id: None,
            tax_amount: Money::ZERO,
            actioned: true,
            previous: None,
        };
        self.rates.refresh_derived(&mut line, self.effective_date);
        Ok(self.finish_actioned(line))
    }
}
