use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::CostLine;
use crate::types::{Identifier, PaymentPattern};

/// recurring invoice definition grouping cost lines billed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub template_id: Identifier,
    /// the template this revision was synthesized from
    pub source_id: Option<Identifier>,
    pub first_invoice_date: NaiveDate,
    pub frequency: u32,
    pub pattern: PaymentPattern,
    pub invoice_group: Option<String>,
    pub vendor_id: Option<u64>,
    pub costs: Vec<CostLine>,
}

/// header fields of a template, as persisted by the invoice store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateHeader {
    pub first_invoice_date: NaiveDate,
    pub frequency: u32,
    pub pattern: PaymentPattern,
    pub invoice_group: Option<String>,
    pub vendor_id: Option<u64>,
}

impl RecurringTemplate {
    pub fn header(&self) -> TemplateHeader {
        TemplateHeader {
            first_invoice_date: self.first_invoice_date,
            frequency: self.frequency,
            pattern: self.pattern,
            invoice_group: self.invoice_group.clone(),
            vendor_id: self.vendor_id,
        }
    }

    /// new revision of this template with no costs yet
    pub fn revision(&self, new_id: Identifier, first_invoice_date: NaiveDate) -> Self {
        Self {
            template_id: new_id,
            source_id: Some(self.template_id),
            first_invoice_date,
            frequency: self.frequency,
            pattern: self.pattern,
            invoice_group: self.invoice_group.clone(),
            vendor_id: self.vendor_id,
            costs: Vec::new(),
        }
    }

    /// copy into a new snapshot untouched by its review
    pub fn carried_forward(&self) -> Self {
        Self {
            costs: self.costs.iter().map(CostLine::carried_forward).collect(),
            ..self.clone()
        }
    }

    /// overwrite header fields with persisted values
    pub fn with_header(mut self, header: TemplateHeader) -> Self {
        self.first_invoice_date = header.first_invoice_date;
        self.frequency = header.frequency;
        self.pattern = header.pattern;
        self.invoice_group = header.invoice_group;
        self.vendor_id = header.vendor_id;
        self
    }

    pub fn actioned_costs(&self) -> impl Iterator<Item = &CostLine> {
        self.costs.iter().filter(|c| c.actioned)
    }

    pub fn unchanged_costs(&self) -> impl Iterator<Item = &CostLine> {
        self.costs.iter().filter(|c| !c.actioned)
    }

    /// per-invoice total before tax
    pub fn invoice_amount(&self) -> Money {
        self.costs.iter().map(|c| c.payment_amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cost_line, date, template};

    #[test]
    fn test_revision_links_source() {
        let t = template(
            Identifier::Persisted(7),
            vec![cost_line(Identifier::Persisted(1), 1, 10, "Base", 1_000)],
        );
        let rev = t.revision(Identifier::Pending(3), date(2024, 7, 1));

        assert_eq!(rev.source_id, Some(Identifier::Persisted(7)));
        assert_eq!(rev.first_invoice_date, date(2024, 7, 1));
        assert!(rev.costs.is_empty());
        assert_eq!(rev.invoice_group, t.invoice_group);
    }

    #[test]
    fn test_partitions_and_totals() {
        let mut t = template(
            Identifier::Persisted(7),
            vec![
                cost_line(Identifier::Persisted(1), 1, 10, "Base", 1_000),
                cost_line(Identifier::Persisted(2), 1, 11, "", 250),
            ],
        );
        t.costs[0].actioned = true;

        assert_eq!(t.actioned_costs().count(), 1);
        assert_eq!(t.unchanged_costs().count(), 1);
        assert_eq!(t.invoice_amount(), Money::from_major(1_250));

        let carried = t.carried_forward();
        assert_eq!(carried.actioned_costs().count(), 0);
        assert_eq!(carried.template_id, Identifier::Persisted(7));
    }

    #[test]
    fn test_with_header() {
        let t = template(Identifier::Persisted(7), Vec::new());
        let mut header = t.header();
        header.invoice_group = Some("North".to_string());
        header.vendor_id = Some(99);

        let refreshed = t.with_header(header);
        assert_eq!(refreshed.invoice_group.as_deref(), Some("North"));
        assert_eq!(refreshed.vendor_id, Some(99));
    }
}
