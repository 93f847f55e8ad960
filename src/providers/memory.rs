use std::collections::{HashMap, HashSet};

use crate::ledger::TemplateHeader;
use crate::providers::{
    AssetProvider, CostCategory, CostCategoryProvider, CpiRegion, CpiRegionProvider,
    InvoiceTemplateStore, TaxRate, TaxRateProvider,
};
use crate::types::{AssetId, CategoryId, TaxRateId};

#[derive(Debug, Clone)]
struct AssetRecord {
    name: String,
    jurisdiction: String,
}

/// in-memory reference data for tests, demos and embedded callers
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    tax_rates: HashMap<String, Vec<TaxRate>>,
    categories: Vec<CostCategory>,
    cpi_regions: Vec<CpiRegion>,
    assets: HashMap<AssetId, AssetRecord>,
    locked_assets: HashSet<AssetId>,
    templates: HashMap<u64, TemplateHeader>,
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tax_rate(mut self, jurisdiction: &str, rate: TaxRate) -> Self {
        let history = self.tax_rates.entry(jurisdiction.to_string()).or_default();
        history.push(rate);
        history.sort_by_key(|r| r.valid_from);
        self
    }

    pub fn with_category(
        mut self,
        id: CategoryId,
        display_name: &str,
        group: &str,
        lease_accounting_significant: bool,
    ) -> Self {
        self.categories.push(CostCategory {
            id,
            display_name: display_name.to_string(),
            group: group.to_string(),
            lease_accounting_significant,
        });
        self
    }

    pub fn with_cpi_region(mut self, id: u64, name: &str) -> Self {
        self.cpi_regions.push(CpiRegion {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_asset(mut self, id: AssetId, name: &str, jurisdiction: &str) -> Self {
        self.assets.insert(
            id,
            AssetRecord {
                name: name.to_string(),
                jurisdiction: jurisdiction.to_string(),
            },
        );
        self
    }

    /// mark an asset as not editable
    pub fn lock_asset(mut self, id: AssetId) -> Self {
        self.locked_assets.insert(id);
        self
    }

    pub fn with_template(mut self, id: u64, header: TemplateHeader) -> Self {
        self.templates.insert(id, header);
        self
    }
}

impl TaxRateProvider for InMemoryReferenceData {
    fn rates_for_jurisdiction(&self, code: &str) -> Vec<TaxRate> {
        self.tax_rates.get(code).cloned().unwrap_or_default()
    }

    fn rate_by_id(&self, jurisdiction: &str, id: TaxRateId) -> Option<TaxRate> {
        self.tax_rates
            .get(jurisdiction)
            .and_then(|rates| rates.iter().find(|r| r.id == id).cloned())
    }
}

impl CostCategoryProvider for InMemoryReferenceData {
    fn all_categories(&self) -> Vec<CostCategory> {
        self.categories.clone()
    }
}

impl CpiRegionProvider for InMemoryReferenceData {
    fn regions(&self) -> Vec<CpiRegion> {
        self.cpi_regions.clone()
    }
}

impl AssetProvider for InMemoryReferenceData {
    fn default_jurisdiction(&self, asset_id: AssetId) -> Option<String> {
        self.assets.get(&asset_id).map(|a| a.jurisdiction.clone())
    }

    fn asset_name(&self, asset_id: AssetId) -> Option<String> {
        self.assets.get(&asset_id).map(|a| a.name.clone())
    }

    fn is_editable(&self, asset_id: AssetId) -> bool {
        self.assets.contains_key(&asset_id) && !self.locked_assets.contains(&asset_id)
    }
}

impl InvoiceTemplateStore for InMemoryReferenceData {
    fn template(&self, template_id: u64) -> Option<TemplateHeader> {
        self.templates.get(&template_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_history_is_ordered() {
        let data = InMemoryReferenceData::new()
            .with_tax_rate(
                "US-CA",
                TaxRate {
                    id: 2,
                    valid_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    valid_to: None,
                    multiplier: Rate::from_percent(dec!(9)),
                },
            )
            .with_tax_rate(
                "US-CA",
                TaxRate {
                    id: 1,
                    valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    valid_to: Some(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
                    multiplier: Rate::from_percent(dec!(8)),
                },
            );

        let history = data.rates_for_jurisdiction("US-CA");
        assert_eq!(history.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(data.rate_by_id("US-CA", 2).map(|r| r.id), Some(2));
        assert!(data.rates_for_jurisdiction("US-NY").is_empty());
    }

    #[test]
    fn test_asset_editability() {
        let data = InMemoryReferenceData::new()
            .with_asset(1, "Warehouse", "US-CA")
            .with_asset(2, "Depot", "US-CA")
            .lock_asset(2);

        assert!(data.is_editable(1));
        assert!(!data.is_editable(2));
        assert!(!data.is_editable(3));
        assert_eq!(data.default_jurisdiction(1).as_deref(), Some("US-CA"));
    }
}
