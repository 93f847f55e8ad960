pub mod tax;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::CostLine;
use crate::providers::TaxRateProvider;
use crate::types::PaymentPattern;

pub use tax::{TaxAssessment, TaxCalculator};

/// how a review changes the payment amount of one targeted line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RateInstruction {
    /// flat replacement amount, `None` leaves the amount as it is
    Fixed { amount: Option<Money> },
    /// percentage increase on the current amount
    FixedPercent { percent: Decimal },
    /// market or cpi re-rate, `estimate + plus` is the uplift percentage
    Estimate { estimate: Decimal, plus: Decimal },
    /// ad-hoc replacement of amount and optionally cadence
    Amend {
        amount: Money,
        frequency: Option<u32>,
        pattern: Option<PaymentPattern>,
    },
}

impl RateInstruction {
    /// new payment amount from the current one
    pub fn payment_amount(&self, current: Money) -> Money {
        match self {
            RateInstruction::Fixed { amount } => amount.unwrap_or(current),
            RateInstruction::FixedPercent { percent } => current.uplift(*percent),
            RateInstruction::Estimate { estimate, plus } => current.uplift(*estimate + *plus),
            RateInstruction::Amend { amount, .. } => *amount,
        }
    }

    /// cadence after the instruction is applied
    pub fn cadence(&self, frequency: u32, pattern: PaymentPattern) -> (u32, PaymentPattern) {
        match self {
            RateInstruction::Amend {
                frequency: new_frequency,
                pattern: new_pattern,
                ..
            } => (new_frequency.unwrap_or(frequency), new_pattern.unwrap_or(pattern)),
            _ => (frequency, pattern),
        }
    }
}

/// annualised amount of a periodic payment
pub fn yearly_amount(payment: Money, frequency: u32, pattern: PaymentPattern) -> Money {
    let frequency = Decimal::from(frequency.max(1));
    match pattern {
        PaymentPattern::Weeks => payment * (Decimal::from(52) / frequency),
        PaymentPattern::Months => payment * (Decimal::from(12) / frequency),
        PaymentPattern::Quarters => payment * (Decimal::from(4) / frequency),
        PaymentPattern::Years => payment,
    }
}

/// computes re-rated amounts and tax for targeted cost lines
pub struct RateCalculator<'a> {
    tax: TaxCalculator<'a>,
}

impl<'a> RateCalculator<'a> {
    pub fn new(tax_rates: &'a dyn TaxRateProvider) -> Self {
        Self {
            tax: TaxCalculator::new(tax_rates),
        }
    }

    pub fn tax(&self) -> &TaxCalculator<'a> {
        &self.tax
    }

    /// apply an instruction to a line's amounts and cadence
    ///
    /// Dates are left to the caller. Tax is assessed at `review_date`.
    pub fn apply(&self, line: &CostLine, instruction: &RateInstruction, review_date: NaiveDate) -> CostLine {
        let (frequency, pattern) = instruction.cadence(line.payment_frequency, line.payment_pattern);
        let mut next = line.clone();
        next.payment_frequency = frequency.max(1);
        next.payment_pattern = pattern;
        next.payment_amount = instruction.payment_amount(line.payment_amount);
        self.refresh_derived(&mut next, review_date);
        next
    }

    /// recompute yearly amount and tax from the payment amount
    pub fn refresh_derived(&self, line: &mut CostLine, review_date: NaiveDate) {
        line.yearly_amount = yearly_amount(line.payment_amount, line.payment_frequency, line.payment_pattern);
        let assessment = self.tax.assess(
            line.payment_amount,
            &line.tax_jurisdiction,
            line.tax_rate_id,
            review_date,
        );
        line.tax_rate_id = assessment.rate_id;
        line.tax_amount = assessment.amount;
    }

    /// take the computed values of an earlier actioning of the same review
    pub fn copy_from(&self, line: &CostLine, earlier: &CostLine) -> CostLine {
        let mut next = line.clone();
        next.payment_amount = earlier.payment_amount;
        next.yearly_amount = earlier.yearly_amount;
        next.payment_frequency = earlier.payment_frequency;
        next.payment_pattern = earlier.payment_pattern;
        next.first_payment_date = earlier.first_payment_date;
        next.tax_rate_id = earlier.tax_rate_id;
        next.tax_amount = earlier.tax_amount;
        next
    }
}
