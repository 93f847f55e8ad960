use chrono::{Datelike, Days, Months, NaiveDate};

use crate::types::PaymentPattern;

/// advances recurring dates by a billing pattern
#[derive(Debug, Clone, Copy)]
pub struct DateProrationCalculator {
    snap_month_end: bool,
}

impl Default for DateProrationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DateProrationCalculator {
    pub fn new() -> Self {
        Self { snap_month_end: true }
    }

    pub fn with_month_end_snapping(snap_month_end: bool) -> Self {
        Self { snap_month_end }
    }

    /// advance one billing period
    pub fn advance(&self, date: NaiveDate, frequency: u32, pattern: PaymentPattern) -> NaiveDate {
        let frequency = frequency.max(1);
        let next = match pattern {
            PaymentPattern::Weeks => date.checked_add_days(Days::new(7 * frequency as u64)),
            PaymentPattern::Months => date.checked_add_months(Months::new(frequency)),
            PaymentPattern::Quarters => date.checked_add_months(Months::new(3 * frequency)),
            PaymentPattern::Years => date.checked_add_months(Months::new(12 * frequency)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// advance `start` period by period until it reaches `target`
    ///
    /// With `inclusive` the result may equal `target`, otherwise it lands
    /// strictly after it. Dates already past the target are returned as-is.
    pub fn advance_to_or_past(
        &self,
        start: NaiveDate,
        target: NaiveDate,
        frequency: u32,
        pattern: PaymentPattern,
        inclusive: bool,
    ) -> NaiveDate {
        let mut current = start;
        while current < target || (!inclusive && current == target) {
            let next = self.advance(current, frequency, pattern);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// realign a cost's first payment to on/after the review date
    ///
    /// Month-based cadences of leases that start on a month end stay on
    /// month ends, so Jan 31 billing does not drift to the 28th/29th.
    pub fn align_first_payment(
        &self,
        lease_start: NaiveDate,
        cost_date: NaiveDate,
        review_date: NaiveDate,
        frequency: u32,
        pattern: PaymentPattern,
    ) -> NaiveDate {
        let aligned = self.advance_to_or_past(cost_date, review_date, frequency, pattern, true);
        if self.snap_month_end && pattern.is_month_based() && is_month_end(lease_start) {
            end_of_month(aligned)
        } else {
            aligned
        }
    }
}

/// whether the date is the last calendar day of its month
pub fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.day() == 1)
}

/// last calendar day of the date's month
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .unwrap_or(date)
}
