/// serialization support for snapshots and timelines
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::decimal::Money;
use crate::ledger::{ActionedSnapshot, CostLine, RecurringTemplate};
use crate::timeline::{Review, ReviewTimeline};
use crate::types::{AssetId, CategoryId, ReviewState, ReviewType};

/// serializable view of one cost line, dates formatted for the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct CostLineView {
    pub id: i64,
    pub source_id: Option<i64>,
    pub asset_id: AssetId,
    pub category_id: CategoryId,
    pub label: String,
    pub payment_amount: Money,
    pub old_payment_amount: Option<Money>,
    pub yearly_amount: Money,
    pub old_yearly_amount: Option<Money>,
    pub payment_frequency: u32,
    pub payment_pattern: String,
    pub first_payment_date: String,
    pub old_first_payment_date: Option<String>,
    pub tax_jurisdiction: String,
    pub tax_amount: Money,
    pub actioned: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateView {
    pub template_id: i64,
    pub source_id: Option<i64>,
    pub first_invoice_date: String,
    pub frequency: u32,
    pub pattern: String,
    pub invoice_group: Option<String>,
    pub invoice_amount: Money,
    pub costs: Vec<CostLineView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotView {
    pub effective_date: String,
    pub priority: i32,
    pub actioned_date: DateTime<Utc>,
    pub actioned_by: String,
    pub cpi_region: Option<String>,
    pub templates: Vec<TemplateView>,
    pub unchanged_templates: Vec<TemplateView>,
    pub unattached_actioned: Vec<CostLineView>,
    pub unattached_unchanged: Vec<CostLineView>,
    pub removed: Vec<CostLineView>,
    pub yearly_total: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewView {
    pub token: String,
    pub review_type: ReviewType,
    pub review_date: String,
    pub state: ReviewState,
    pub snapshot: Option<SnapshotView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineView {
    pub locale: String,
    pub reviews: Vec<ReviewView>,
}

impl CostLineView {
    pub fn from_line(line: &CostLine, ctx: &RequestContext<'_>) -> Self {
        CostLineView {
            id: line.id.to_raw(),
            source_id: line.source_id.map(|id| id.to_raw()),
            asset_id: line.asset_id,
            category_id: line.category_id,
            label: line.label.clone(),
            payment_amount: line.payment_amount,
            old_payment_amount: line.old_payment_amount(),
            yearly_amount: line.yearly_amount,
            old_yearly_amount: line.old_yearly_amount(),
            payment_frequency: line.payment_frequency,
            payment_pattern: format!("{:?}", line.payment_pattern),
            first_payment_date: ctx.format_date(line.first_payment_date),
            old_first_payment_date: line.old_first_payment_date().map(|d| ctx.format_date(d)),
            tax_jurisdiction: line.tax_jurisdiction.clone(),
            tax_amount: line.tax_amount,
            actioned: line.actioned,
        }
    }
}

impl TemplateView {
    pub fn from_template(template: &RecurringTemplate, ctx: &RequestContext<'_>) -> Self {
        TemplateView {
            template_id: template.template_id.to_raw(),
            source_id: template.source_id.map(|id| id.to_raw()),
            first_invoice_date: ctx.format_date(template.first_invoice_date),
            frequency: template.frequency,
            pattern: format!("{:?}", template.pattern),
            invoice_group: template.invoice_group.clone(),
            invoice_amount: template.invoice_amount(),
            costs: template.costs.iter().map(|c| CostLineView::from_line(c, ctx)).collect(),
        }
    }
}

impl SnapshotView {
    pub fn from_snapshot(snapshot: &ActionedSnapshot, ctx: &RequestContext<'_>) -> Self {
        let ledger = &snapshot.ledger;
        let lines = |lines: &[CostLine]| lines.iter().map(|c| CostLineView::from_line(c, ctx)).collect();
        let templates = |templates: &[RecurringTemplate]| {
            templates.iter().map(|t| TemplateView::from_template(t, ctx)).collect()
        };

        SnapshotView {
            effective_date: ctx.format_date(snapshot.effective_date),
            priority: snapshot.priority,
            actioned_date: snapshot.actioned_date,
            actioned_by: snapshot.actioned_by.clone(),
            cpi_region: snapshot.cpi_region.clone(),
            templates: templates(&ledger.templates),
            unchanged_templates: templates(&ledger.unchanged_templates),
            unattached_actioned: lines(&ledger.unattached_actioned),
            unattached_unchanged: lines(&ledger.unattached_unchanged),
            removed: lines(&ledger.removed),
            yearly_total: ledger.yearly_total(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl ReviewView {
    pub fn from_review(review: &Review, ctx: &RequestContext<'_>) -> Self {
        ReviewView {
            token: review.token.clone(),
            review_type: review.review_type(),
            review_date: ctx.format_date(review.review_date),
            state: review.state(),
            snapshot: review
                .actioned_snapshot
                .as_ref()
                .map(|s| SnapshotView::from_snapshot(s, ctx)),
        }
    }
}

impl TimelineView {
    /// reviews in timeline order
    pub fn from_timeline(timeline: &ReviewTimeline, ctx: &RequestContext<'_>) -> Self {
        TimelineView {
            locale: ctx.locale.clone(),
            reviews: timeline
                .ordered_reviews()
                .into_iter()
                .map(|r| ReviewView::from_review(r, ctx))
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
