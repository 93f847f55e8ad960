//! shared builders for unit tests

use chrono::{NaiveDate, TimeZone, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

use crate::contract::{Contract, Term};
use crate::decimal::{Money, Rate};
use crate::ledger::{CostLine, RecurringTemplate};
use crate::providers::{InMemoryReferenceData, TaxRate};
use crate::types::{AssetId, CategoryId, Identifier, PaymentPattern};

pub const ASSET_A: AssetId = 1;
pub const ASSET_B: AssetId = 2;
pub const RENT: CategoryId = 10;
pub const UTILITIES: CategoryId = 11;
pub const OUTGOINGS: CategoryId = 12;
pub const CPI_SYDNEY: u64 = 3;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn test_time() -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()))
}

/// monthly line billed from 2024-01-01 in US-CA
pub fn cost_line(
    id: Identifier,
    asset_id: AssetId,
    category_id: CategoryId,
    label: &str,
    amount: i64,
) -> CostLine {
    CostLine {
        id,
        source_id: None,
        asset_id,
        category_id,
        label: label.to_string(),
        payment_amount: Money::from_major(amount),
        yearly_amount: Money::from_major(amount * 12),
        payment_frequency: 1,
        payment_pattern: PaymentPattern::Months,
        first_payment_date: date(2024, 1, 1),
        tax_jurisdiction: "US-CA".to_string(),
        tax_rate_id: None,
        tax_amount: Money::ZERO,
        actioned: false,
        previous: None,
    }
}

/// monthly template invoicing from 2024-01-01
pub fn template(id: Identifier, costs: Vec<CostLine>) -> RecurringTemplate {
    RecurringTemplate {
        template_id: id,
        source_id: None,
        first_invoice_date: date(2024, 1, 1),
        frequency: 1,
        pattern: PaymentPattern::Months,
        invoice_group: Some("Main".to_string()),
        vendor_id: None,
        costs,
    }
}

/// US-CA at 8% for 2024, two assets, three categories, one cpi region
pub fn reference_data() -> InMemoryReferenceData {
    InMemoryReferenceData::new()
        .with_tax_rate(
            "US-CA",
            TaxRate {
                id: 1,
                valid_from: date(2024, 1, 1),
                valid_to: None,
                multiplier: Rate::from_percent(dec!(8)),
            },
        )
        .with_category(RENT, "Base Rent", "Rent", true)
        .with_category(UTILITIES, "Utilities", "Outgoings", false)
        .with_category(OUTGOINGS, "Outgoings", "Outgoings", false)
        .with_cpi_region(CPI_SYDNEY, "Sydney")
        .with_asset(ASSET_A, "Warehouse A", "US-CA")
        .with_asset(ASSET_B, "Depot B", "US-CA")
}

/// one exercised term covering calendar 2024 on asset A
pub fn contract_2024() -> Contract {
    Contract::new(
        500,
        ASSET_A,
        vec![Term::initial(date(2024, 1, 1), Some(date(2024, 12, 31)))],
    )
}
