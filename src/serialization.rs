/// serializable views of plans for host display
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::plan::InstallmentPlan;
use crate::schedule::RepaymentEntry;
use crate::types::{EntryStatus, PlanId, PlanStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanView {
    pub id: PlanId,
    pub customer_id: String,
    pub status: PlanStatus,
    pub created_on: NaiveDate,
    pub closed_on: Option<NaiveDate>,
    pub terms: TermsView,
    pub progress: ProgressView,
    pub schedule: Vec<EntryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermsView {
    pub down_payment: Money,
    pub financed_amount: Money,
    pub interest_rate_percent: Decimal,
    pub tenure_months: u32,
    pub emi_amount: Money,
    pub total_interest: Money,
    pub total_payable: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressView {
    pub paid_installments: u32,
    pub remaining_installments: u32,
    pub next_due_date: Option<NaiveDate>,
    pub total_paid: Money,
    pub outstanding_amount: Money,
    pub overdue_count: u32,
    pub overdue_amount: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryView {
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub emi_amount: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
    pub paid: Money,
    pub outstanding: Money,
    pub status: EntryStatus,
    pub paid_date: Option<NaiveDate>,
}

impl From<&RepaymentEntry> for EntryView {
    fn from(entry: &RepaymentEntry) -> Self {
        EntryView {
            installment_no: entry.installment_no,
            due_date: entry.due_date,
            emi_amount: entry.emi_amount,
            principal: entry.principal,
            interest: entry.interest,
            balance: entry.balance,
            paid: entry.covered(),
            outstanding: entry.outstanding(),
            status: entry.status,
            paid_date: entry.paid_date,
        }
    }
}

impl PlanView {
    pub fn from_plan(plan: &InstallmentPlan) -> Self {
        PlanView {
            id: plan.id,
            customer_id: plan.customer_id.clone(),
            status: plan.status,
            created_on: plan.created_on,
            closed_on: plan.closed_on,
            terms: TermsView {
                down_payment: plan.schedule.down_payment,
                financed_amount: plan.financed_amount(),
                interest_rate_percent: plan.schedule.interest_rate.as_percentage(),
                tenure_months: plan.schedule.tenure_months,
                emi_amount: plan.emi_amount(),
                total_interest: plan.total_interest(),
                total_payable: plan.total_payable(),
            },
            progress: ProgressView {
                paid_installments: plan.paid_installments,
                remaining_installments: plan.remaining_installments,
                next_due_date: plan.next_due_date,
                total_paid: plan.total_paid(),
                outstanding_amount: plan.outstanding_amount(),
                overdue_count: plan.overdue_count(),
                overdue_amount: plan.overdue_amount(),
            },
            schedule: plan.entries().iter().map(EntryView::from).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl InstallmentPlan {
    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        PlanView::from_plan(self)
            .to_json_pretty()
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.to_json_pretty()
    }
}
