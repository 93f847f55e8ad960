use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{CostKey, Identifier, ReviewToken, ReviewType};

/// audit events emitted while actioning, reverting and committing reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // review lifecycle events
    ReviewActioned {
        token: ReviewToken,
        review_type: ReviewType,
        effective_date: NaiveDate,
        priority: i32,
        actioned_costs: usize,
        carried_costs: usize,
        removed_costs: usize,
        actioned_by: String,
        timestamp: DateTime<Utc>,
    },
    ReviewReverted {
        token: ReviewToken,
        effective_date: NaiveDate,
        priority: i32,
        reverted_by: String,
        timestamp: DateTime<Utc>,
    },

    // cost line events
    CostLineActioned {
        token: ReviewToken,
        key: CostKey,
        old_amount: Option<Money>,
        new_amount: Money,
        first_payment_date: NaiveDate,
    },
    CostLineRemoved {
        token: ReviewToken,
        key: CostKey,
        amount: Money,
    },

    // template events
    TemplateRebuilt {
        token: ReviewToken,
        source_id: Identifier,
        new_id: Identifier,
        first_invoice_date: NaiveDate,
        cost_count: usize,
    },
    TemplateRetired {
        token: ReviewToken,
        template_id: Identifier,
    },

    // persistence events
    SnapshotCommitted {
        commit_id: Uuid,
        contract_id: u64,
        version: u64,
        assigned_ids: usize,
        removed_invoices: usize,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
