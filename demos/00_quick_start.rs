/// quick start - action the commencing review and a fixed rent review
use chrono::{NaiveDate, TimeZone, Utc};
use lease_review_rs::providers::TaxRate;
use lease_review_rs::serialization::SnapshotView;
use lease_review_rs::{
    ActionRequest, Collaborators, Contract, CostDraft, CostKey, FixedItem, InMemoryReferenceData, Money, Rate,
    RequestContext, Review, ReviewActioningEngine, ReviewInstructions, ReviewType,
    SafeTimeProvider, Term, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date");

    // reference data: one asset, one category, 8% tax
    let data = InMemoryReferenceData::new()
        .with_tax_rate(
            "US-CA",
            TaxRate {
                id: 1,
                valid_from: date(2024, 1, 1)?,
                valid_to: None,
                multiplier: Rate::from_percent(dec!(8)),
            },
        )
        .with_category(10, "Base Rent", "Rent", true)
        .with_asset(1, "Warehouse A", "US-CA");

    let contract = Contract::new(500, 1, vec![Term::initial(date(2024, 1, 1)?, Some(date(2026, 12, 31)?))]);

    let engine = ReviewActioningEngine::default();
    let timeline = engine.timeline(
        vec![
            Review::new(
                "costs",
                date(2024, 1, 1)?,
                ReviewInstructions::Commencing {
                    costs: vec![CostDraft::monthly(1, 10, "Base", Money::from_major(1_000))],
                },
            ),
            Review::new(
                "year-2",
                date(2025, 1, 1)?,
                ReviewInstructions::Fixed {
                    items: vec![FixedItem {
                        key: CostKey::new(1, 10, "Base"),
                        amount: Some(Money::from_major(1_100)),
                    }],
                },
            ),
        ],
    );

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()));
    let ctx = RequestContext::new("ops", &time);

    // commencing first, then the scheduled review
    let commenced = engine.action(
        &timeline,
        &contract,
        &ActionRequest::new("costs", ReviewType::Commencing),
        Collaborators::from_source(&data),
        &ctx,
    )?;
    let reviewed = engine.action(
        &commenced.timeline,
        &contract,
        &ActionRequest::new("year-2", ReviewType::Fixed),
        Collaborators::from_source(&data),
        &ctx,
    )?;

    println!("{}", SnapshotView::from_snapshot(&reviewed.snapshot, &ctx).to_json_pretty()?);

    Ok(())
}
