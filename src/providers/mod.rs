pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::ledger::TemplateHeader;
use crate::types::{AssetId, CategoryId, CpiRegionId, TaxRateId};

pub use memory::InMemoryReferenceData;

/// one entry of a jurisdiction's tax rate history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    pub valid_from: NaiveDate,
    /// inclusive; `None` while the rate is current
    pub valid_to: Option<NaiveDate>,
    /// fraction of the payment amount (0.08 for 8%)
    pub multiplier: Rate,
}

impl TaxRate {
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.map_or(true, |to| date <= to)
    }
}

/// cost category master data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCategory {
    pub id: CategoryId,
    pub display_name: String,
    pub group: String,
    pub lease_accounting_significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiRegion {
    pub id: CpiRegionId,
    pub name: String,
}

/// tax rate histories per jurisdiction
pub trait TaxRateProvider {
    /// rate history ordered by `valid_from`
    fn rates_for_jurisdiction(&self, code: &str) -> Vec<TaxRate>;

    fn rate_by_id(&self, jurisdiction: &str, id: TaxRateId) -> Option<TaxRate>;
}

pub trait CostCategoryProvider {
    fn all_categories(&self) -> Vec<CostCategory>;

    fn category(&self, id: CategoryId) -> Option<CostCategory> {
        self.all_categories().into_iter().find(|c| c.id == id)
    }
}

pub trait CpiRegionProvider {
    fn regions(&self) -> Vec<CpiRegion>;
}

/// asset master data
pub trait AssetProvider {
    fn default_jurisdiction(&self, asset_id: AssetId) -> Option<String>;

    fn asset_name(&self, asset_id: AssetId) -> Option<String>;

    fn is_editable(&self, asset_id: AssetId) -> bool;
}

/// persisted recurring invoice templates
pub trait InvoiceTemplateStore {
    fn template(&self, template_id: u64) -> Option<TemplateHeader>;
}

/// the collaborators one engine call consults
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub tax_rates: &'a dyn TaxRateProvider,
    pub categories: &'a dyn CostCategoryProvider,
    pub cpi_regions: &'a dyn CpiRegionProvider,
    pub assets: &'a dyn AssetProvider,
    pub templates: &'a dyn InvoiceTemplateStore,
}

impl<'a> Collaborators<'a> {
    /// use one source for every collaborator
    pub fn from_source<T>(source: &'a T) -> Self
    where
        T: TaxRateProvider
            + CostCategoryProvider
            + CpiRegionProvider
            + AssetProvider
            + InvoiceTemplateStore,
    {
        Self {
            tax_rates: source,
            categories: source,
            cpi_regions: source,
            assets: source,
            templates: source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_rate_validity_window() {
        let rate = TaxRate {
            id: 1,
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            valid_to: Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
            multiplier: Rate::from_percent(dec!(8)),
        };

        assert!(rate.is_valid_on(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!rate.is_valid_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!(!rate.is_valid_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }
}
