pub mod config;
pub mod context;
pub mod contract;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod persistence;
pub mod proration;
pub mod providers;
pub mod rates;
pub mod revert;
pub mod serialization;
pub mod timeline;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

// re-export key types
pub use config::EngineConfig;
pub use context::RequestContext;
pub use contract::{Contract, Term};
pub use decimal::{Money, Rate};
pub use engine::{
    ActionOutcome, ActionRequest, CostSelection, PartitionReport, ReviewActioningEngine,
    SelectedCosts, SelectionCandidate,
};
pub use errors::{ReviewError, Result};
pub use events::{Event, EventStore};
pub use ledger::{ActionedSnapshot, CostLedger, CostLine, IdAllocator, RecurringTemplate, TemplateHeader};
pub use persistence::{
    CommitReceipt, ContractCommit, ContractRepository, InMemoryContractRepository, StoredContract,
    UnsubmittedInvoice,
};
pub use proration::DateProrationCalculator;
pub use providers::{
    AssetProvider, Collaborators, CostCategory, CostCategoryProvider, CpiRegion, CpiRegionProvider,
    InMemoryReferenceData, InvoiceTemplateStore, TaxRate, TaxRateProvider,
};
pub use rates::{RateCalculator, RateInstruction, TaxCalculator};
pub use revert::{RevertCoordinator, RevertOutcome};
pub use serialization::{SnapshotView, TimelineView};
pub use timeline::{
    AdjustmentChange, CostDraft, EstimateItem, FixedItem, PercentItem, Review, ReviewInstructions,
    ReviewTimeline,
};
pub use types::{
    AssetId, CategoryId, CostKey, Identifier, PaymentPattern, ReviewState, ReviewToken, ReviewType,
    TermState,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
