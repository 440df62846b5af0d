use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlanTerms;
use crate::decimal::{Money, Rate};
use crate::errors::{PlanError, Result};
use crate::types::EntryStatus;

use super::status::classify_statuses;

/// one period of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentEntry {
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub emi_amount: Money,
    pub principal: Money,
    pub interest: Money,
    /// outstanding principal once this installment is paid
    pub balance: Money,
    pub actual_paid_amount: Money,
    pub misc_adjusted_amount: Money,
    pub status: EntryStatus,
    pub paid_date: Option<NaiveDate>,
}

impl RepaymentEntry {
    /// cash plus misc credit applied so far
    pub fn covered(&self) -> Money {
        self.actual_paid_amount + self.misc_adjusted_amount
    }

    /// emi minus what is covered, may be <= 0 for a settled entry
    pub fn owed(&self) -> Money {
        self.emi_amount - self.covered()
    }

    /// owed, floored at zero
    pub fn outstanding(&self) -> Money {
        self.owed().max(Money::ZERO)
    }
}

/// full repayment schedule of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub financed_amount: Money,
    pub down_payment: Money,
    pub interest_rate: Rate,
    pub tenure_months: u32,
    pub start_date: NaiveDate,
    /// regular installment amount; the final entry may differ by a few cents
    pub emi_amount: Money,
    pub entries: Vec<RepaymentEntry>,
    pub total_interest: Money,
    pub total_payable: Money,
}

impl AmortizationSchedule {
    /// build the repayment schedule and classify entries against `today`
    pub fn generate(
        base_amount: Money,
        down_payment: Money,
        interest_rate: Rate,
        tenure_months: u32,
        start_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self> {
        let terms = PlanTerms {
            base_amount,
            down_payment,
            interest_rate,
            tenure_months,
            start_date,
        };
        Self::from_terms(&terms, today)
    }

    pub fn from_terms(terms: &PlanTerms, today: NaiveDate) -> Result<Self> {
        terms.validate()?;

        let financed = terms.financed_amount();
        let monthly_rate = terms.interest_rate.monthly_rate().as_decimal();
        let emi = calculate_emi(financed, monthly_rate, terms.tenure_months)?;

        let mut entries = build_entries(
            financed,
            monthly_rate,
            emi,
            terms.tenure_months,
            terms.start_date,
        )?;
        classify_statuses(&mut entries, today);

        let total_interest: Money = entries.iter().map(|e| e.interest).sum();
        let total_emi: Money = entries.iter().map(|e| e.emi_amount).sum();

        debug!(
            financed = %financed,
            rate = %terms.interest_rate,
            tenure = terms.tenure_months,
            emi = %emi,
            total_interest = %total_interest,
            "generated repayment schedule"
        );

        Ok(Self {
            financed_amount: financed,
            down_payment: terms.down_payment,
            interest_rate: terms.interest_rate,
            tenure_months: terms.tenure_months,
            start_date: terms.start_date,
            emi_amount: emi,
            entries,
            total_interest,
            total_payable: terms.down_payment + total_emi,
        })
    }

    /// get entry by 1-based installment number
    pub fn get_entry(&self, installment_no: u32) -> Option<&RepaymentEntry> {
        installment_no
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx as usize))
    }

    /// outstanding principal after the given installment
    pub fn balance_after(&self, installment_no: u32) -> Money {
        self.get_entry(installment_no)
            .map(|e| e.balance)
            .unwrap_or(self.financed_amount)
    }

    /// sum of principal across all entries
    pub fn total_principal(&self) -> Money {
        self.entries.iter().map(|e| e.principal).sum()
    }
}

/// fixed installment for the financed amount
///
/// `EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)`, or `P / n` when the plan is interest free
pub fn calculate_emi(financed: Money, monthly_rate: Decimal, months: u32) -> Result<Money> {
    if months == 0 {
        return Err(PlanError::invalid_params("tenure must be at least one month"));
    }

    if monthly_rate.is_zero() {
        return Ok(financed / Decimal::from(months));
    }

    let overflow = || PlanError::invalid_params("installment calculation overflowed");

    let base = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound = compound.checked_mul(base).ok_or_else(overflow)?;
    }

    let numerator = financed
        .as_decimal()
        .checked_mul(monthly_rate)
        .and_then(|n| n.checked_mul(compound))
        .ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;

    numerator
        .checked_div(denominator)
        .map(Money::from_decimal)
        .ok_or_else(overflow)
}

fn build_entries(
    financed: Money,
    monthly_rate: Decimal,
    emi: Money,
    tenure_months: u32,
    start_date: NaiveDate,
) -> Result<Vec<RepaymentEntry>> {
    let mut entries = Vec::with_capacity(tenure_months as usize);
    let mut balance = financed;

    for i in 1..=tenure_months {
        let due_date = add_months(start_date, i)?;
        let interest = balance * monthly_rate;

        // final period takes the residual so the balance closes at exactly zero
        let (principal, emi_amount) = if i == tenure_months {
            (balance, balance + interest)
        } else {
            let principal = (emi - interest).min(balance);
            (principal, principal + interest)
        };
        balance -= principal;

        if !emi_amount.is_positive() {
            return Err(PlanError::invalid_params(format!(
                "financed amount {} is too small for {} installments",
                financed, tenure_months
            )));
        }

        entries.push(RepaymentEntry {
            installment_no: i,
            due_date,
            emi_amount,
            principal,
            interest,
            balance,
            actual_paid_amount: Money::ZERO,
            misc_adjusted_amount: Money::ZERO,
            status: EntryStatus::Upcoming,
            paid_date: None,
        });
    }

    Ok(entries)
}

/// calendar month addition, clamping the day to the end of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        PlanError::invalid_params(format!("due date out of range: {} + {} months", date, months))
    })
}
