pub mod cost_line;
pub mod snapshot;
pub mod template;

pub use cost_line::{CostLine, PriorValues};
pub use snapshot::{ActionedSnapshot, CostLedger, CostLocation, LocatedCost};
pub use template::{RecurringTemplate, TemplateHeader};

use crate::types::Identifier;

/// mints pending identifiers for entities synthesized in one computation
///
/// Minting is deterministic, so recomputing the same snapshot yields the
/// same identifiers.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// start past every pending token used by any of the ledgers
    pub fn past<'a>(ledgers: impl IntoIterator<Item = &'a CostLedger>) -> Self {
        let max = ledgers.into_iter().map(CostLedger::max_pending_token).max().unwrap_or(0);
        Self { next: max + 1 }
    }

    pub fn mint(&mut self) -> Identifier {
        let id = Identifier::Pending(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::cost_line;

    #[test]
    fn test_allocator_skips_used_tokens() {
        let mut ledger = CostLedger::new();
        ledger
            .unattached_actioned
            .push(cost_line(Identifier::Pending(6), 1, 10, "Base", 100));

        let mut ids = IdAllocator::past([&ledger]);
        assert_eq!(ids.mint(), Identifier::Pending(7));
        assert_eq!(ids.mint(), Identifier::Pending(8));
        assert_eq!(IdAllocator::new().mint(), Identifier::Pending(1));

        let mut other = CostLedger::new();
        other.removed.push(cost_line(Identifier::Pending(9), 1, 10, "Old", 100));
        assert_eq!(IdAllocator::past([&ledger, &other]).mint(), Identifier::Pending(10));
    }
}
