use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::contract::Contract;
use crate::decimal::Money;
use crate::errors::{ReviewError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{CostLedger, CostLine};
use crate::timeline::ReviewTimeline;
use crate::types::Identifier;

/// generated invoice not yet submitted for payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubmittedInvoice {
    pub invoice_id: u64,
    pub template_id: u64,
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// a contract with its timeline as last committed
#[derive(Debug, Clone, PartialEq)]
pub struct StoredContract {
    pub contract: Contract,
    pub timeline: ReviewTimeline,
    pub version: u64,
}

/// new timeline state to persist for one contract
#[derive(Debug, Clone)]
pub struct ContractCommit {
    pub contract_id: u64,
    /// version the caller loaded; the commit fails if it moved on
    pub expected_version: u64,
    pub timeline: ReviewTimeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAssignment {
    pub pending: Identifier,
    pub persisted: u64,
}

#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub commit_id: Uuid,
    pub version: u64,
    /// the committed timeline with every pending id replaced
    pub timeline: ReviewTimeline,
    pub assignments: Vec<IdAssignment>,
    /// invoices deleted because their template is no longer billed
    pub removed_invoices: Vec<UnsubmittedInvoice>,
    pub retained_invoices: Vec<UnsubmittedInvoice>,
    pub events: Vec<Event>,
}

/// transactional store for contracts and their review timelines
pub trait ContractRepository {
    fn load(&self, contract_id: u64) -> Result<StoredContract>;

    /// persist atomically: either everything is written or nothing is
    fn commit(&mut self, commit: ContractCommit, ctx: &RequestContext<'_>) -> Result<CommitReceipt>;
}

/// in-memory repository for tests and embedded callers
#[derive(Debug, Clone)]
pub struct InMemoryContractRepository {
    contracts: HashMap<u64, StoredContract>,
    invoices: HashMap<u64, Vec<UnsubmittedInvoice>>,
    next_id: u64,
}

impl Default for InMemoryContractRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self {
            contracts: HashMap::new(),
            invoices: HashMap::new(),
            next_id: 1_000,
        }
    }

    /// register a contract at version 0
    pub fn insert(&mut self, contract: Contract, timeline: ReviewTimeline) {
        self.contracts.insert(
            contract.contract_id,
            StoredContract {
                contract,
                timeline,
                version: 0,
            },
        );
    }

    pub fn add_invoice(&mut self, contract_id: u64, invoice: UnsubmittedInvoice) {
        self.invoices.entry(contract_id).or_default().push(invoice);
    }

    pub fn invoices(&self, contract_id: u64) -> &[UnsubmittedInvoice] {
        self.invoices.get(&contract_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl ContractRepository for InMemoryContractRepository {
    fn load(&self, contract_id: u64) -> Result<StoredContract> {
        self.contracts
            .get(&contract_id)
            .cloned()
            .ok_or(ReviewError::ContractNotFound { contract_id })
    }

    fn commit(&mut self, commit: ContractCommit, ctx: &RequestContext<'_>) -> Result<CommitReceipt> {
        let stored = self
            .contracts
            .get(&commit.contract_id)
            .ok_or(ReviewError::ContractNotFound {
                contract_id: commit.contract_id,
            })?;
        if stored.version != commit.expected_version {
            return Err(ReviewError::ConcurrencyConflict {
                expected: commit.expected_version,
                actual: stored.version,
            });
        }

        let mut timeline = commit.timeline;
        let mut assigner = IdAssigner::new(self.next_id);
        let mut order: Vec<usize> = (0..timeline.reviews().len()).collect();
        order.sort_by_key(|i| timeline.reviews()[*i].ordering_key());
        for index in order {
            let review = &mut timeline.reviews_mut()[index];
            for snapshot in review
                .actioned_snapshot
                .iter_mut()
                .chain(review.prior_actioned_snapshot.iter_mut())
            {
                snapshot.ledger.validate()?;
                assigner.assign_ledger(&mut snapshot.ledger);
            }
        }

        let billed: HashSet<u64> = timeline
            .latest_actioned()
            .and_then(|r| r.actioned_snapshot.as_ref())
            .map(|s| s.ledger.all_templates().filter_map(|t| t.template_id.persisted_id()).collect())
            .unwrap_or_default();
        let (retained_invoices, removed_invoices): (Vec<_>, Vec<_>) = self
            .invoices(commit.contract_id)
            .iter()
            .cloned()
            .partition(|invoice| billed.contains(&invoice.template_id));

        let version = stored.version + 1;
        let commit_id = Uuid::new_v4();
        let contract = stored.contract.clone();

        self.next_id = assigner.next_id;
        self.invoices.insert(commit.contract_id, retained_invoices.clone());
        self.contracts.insert(
            commit.contract_id,
            StoredContract {
                contract,
                timeline: timeline.clone(),
                version,
            },
        );

        let mut events = EventStore::new();
        events.emit(Event::SnapshotCommitted {
            commit_id,
            contract_id: commit.contract_id,
            version,
            assigned_ids: assigner.assignments.len(),
            removed_invoices: removed_invoices.len(),
            timestamp: ctx.now(),
        });
        tracing::info!(
            %commit_id,
            contract_id = commit.contract_id,
            version,
            assigned_ids = assigner.assignments.len(),
            removed_invoices = removed_invoices.len(),
            "committed review timeline"
        );

        Ok(CommitReceipt {
            commit_id,
            version,
            timeline,
            assignments: assigner.assignments,
            removed_invoices,
            retained_invoices,
            events: events.take_events(),
        })
    }
}

/// replaces pending ids with persisted ones, one id per pending token
struct IdAssigner {
    next_id: u64,
    assigned: HashMap<u32, u64>,
    assignments: Vec<IdAssignment>,
}

impl IdAssigner {
    fn new(next_id: u64) -> Self {
        Self {
            next_id,
            assigned: HashMap::new(),
            assignments: Vec::new(),
        }
    }

    fn resolve(&mut self, id: Identifier) -> Identifier {
        let Identifier::Pending(token) = id else {
            return id;
        };
        if let Some(persisted) = self.assigned.get(&token) {
            return Identifier::Persisted(*persisted);
        }
        let persisted = self.next_id;
        self.next_id += 1;
        self.assigned.insert(token, persisted);
        self.assignments.push(IdAssignment { pending: id, persisted });
        Identifier::Persisted(persisted)
    }

    fn assign_line(&mut self, line: &mut CostLine) {
        line.id = self.resolve(line.id);
        line.source_id = line.source_id.map(|id| self.resolve(id));
    }

    fn assign_ledger(&mut self, ledger: &mut CostLedger) {
        for template in ledger.templates.iter_mut().chain(ledger.unchanged_templates.iter_mut()) {
            template.template_id = self.resolve(template.template_id);
            template.source_id = template.source_id.map(|id| self.resolve(id));
            for line in &mut template.costs {
                self.assign_line(line);
            }
        }
        for line in ledger
            .unattached_actioned
            .iter_mut()
            .chain(ledger.unattached_unchanged.iter_mut())
            .chain(ledger.removed.iter_mut())
        {
            self.assign_line(line);
        }
    }
}
