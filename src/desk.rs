use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::collaborators::{MiscBalanceLedger, PlanRepository};
use crate::decimal::Money;
use crate::errors::Result;
use crate::plan::{InstallmentPlan, InstallmentPlanBuilder};
use crate::schedule::PaymentResult;
use crate::types::{PaymentSource, PlanId, PlanStatus, SettlementStatus};

/// what happened at the counter for one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub plan_id: PlanId,
    pub installment_no: u32,
    pub cash: PaymentResult,
    /// misc credit used to top up a partial cash payment
    pub misc: Option<PaymentResult>,
    pub credited_to_misc_balance: Money,
    pub plan_status: PlanStatus,
    pub paid_installments: u32,
    pub remaining_installments: u32,
    pub next_due_date: Option<NaiveDate>,
}

/// host-side orchestration of plans, the customer ledger and the clock
///
/// Every write takes `&mut self`, so a desk is the single writer for the
/// plans it serves. Plans are worked on as loaded copies. Ledger postings are
/// made before the save and reversed if the save fails, so an error leaves
/// both the stored plan and the ledger as they were.
pub struct InstallmentDesk<R, L, C> {
    repository: R,
    ledger: L,
    clock: C,
}

impl<R, L, C> InstallmentDesk<R, L, C>
where
    R: PlanRepository,
    L: MiscBalanceLedger,
    C: Clock,
{
    pub fn new(repository: R, ledger: L, clock: C) -> Self {
        Self {
            repository,
            ledger,
            clock,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// build and store a new plan
    pub fn open_plan(&mut self, builder: InstallmentPlanBuilder) -> Result<PlanId> {
        let plan = builder.build(&self.clock)?;
        self.repository.save(&plan)?;
        Ok(plan.id)
    }

    /// current plan with statuses as of today
    pub fn plan(&self, plan_id: PlanId) -> Result<InstallmentPlan> {
        let mut plan = self.repository.load(plan_id)?;
        plan.refresh_statuses(&self.clock);
        Ok(plan)
    }

    /// reclassify and persist
    pub fn refresh(&mut self, plan_id: PlanId) -> Result<InstallmentPlan> {
        let plan = self.plan(plan_id)?;
        self.repository.save(&plan)?;
        Ok(plan)
    }

    pub fn preview(&self, plan_id: PlanId, installment_no: u32, amount: Money) -> Result<PaymentResult> {
        let plan = self.repository.load(plan_id)?;
        plan.preview_payment(installment_no, amount, PaymentSource::Cash, &self.clock)
    }

    /// take cash against an installment
    ///
    /// With `auto_apply_misc_balance`, a partial cash payment is topped up from
    /// the customer's misc balance. With `credit_overpayment`, cash beyond what
    /// was owed is credited to that balance.
    pub fn pay_installment(
        &mut self,
        plan_id: PlanId,
        installment_no: u32,
        amount: Money,
    ) -> Result<PaymentReceipt> {
        let mut plan = self.repository.load(plan_id)?;
        let rules = plan.config.reconciliation.clone();

        let cash = plan.pay_installment(installment_no, amount, &self.clock)?;

        let mut misc = None;
        if rules.auto_apply_misc_balance && cash.status == SettlementStatus::Partial {
            let available = self.ledger.balance(&plan.customer_id);
            if available.is_positive() {
                misc = Some(plan.apply_misc_balance(installment_no, available, &self.clock)?);
            }
        }

        let credited = if rules.credit_overpayment {
            cash.overpayment
        } else {
            Money::ZERO
        };
        let debited = misc.as_ref().map(|m| m.applied).unwrap_or(Money::ZERO);

        self.commit(&plan, debited, credited)?;

        info!(
            plan_id = %plan.id,
            installment = installment_no,
            cash = %cash.applied,
            misc = %debited,
            credited = %credited,
            "installment payment recorded"
        );

        Ok(PaymentReceipt {
            plan_id,
            installment_no,
            cash,
            misc,
            credited_to_misc_balance: credited,
            plan_status: plan.status,
            paid_installments: plan.paid_installments,
            remaining_installments: plan.remaining_installments,
            next_due_date: plan.next_due_date,
        })
    }

    /// cover an installment from the customer's misc balance
    ///
    /// Returns `None` when the customer has no credit.
    pub fn apply_misc_balance(
        &mut self,
        plan_id: PlanId,
        installment_no: u32,
    ) -> Result<Option<PaymentResult>> {
        let mut plan = self.repository.load(plan_id)?;
        let available = self.ledger.balance(&plan.customer_id);
        if !available.is_positive() {
            return Ok(None);
        }

        let result = plan.apply_misc_balance(installment_no, available, &self.clock)?;
        self.commit(&plan, result.applied, Money::ZERO)?;

        Ok(Some(result))
    }

    /// post the ledger movements for a changed plan, then save it
    fn commit(&mut self, plan: &InstallmentPlan, debit: Money, credit: Money) -> Result<()> {
        let customer = plan.customer_id.as_str();

        if debit.is_positive() {
            self.ledger.debit(customer, debit)?;
        }
        if credit.is_positive() {
            if let Err(e) = self.ledger.credit(customer, credit) {
                self.reverse(customer, debit, Money::ZERO);
                return Err(e);
            }
        }

        if let Err(e) = self.repository.save(plan) {
            self.reverse(customer, debit, credit);
            return Err(e);
        }
        Ok(())
    }

    /// undo postings made by `commit`
    fn reverse(&mut self, customer: &str, debited: Money, credited: Money) {
        if credited.is_positive() {
            if let Err(e) = self.ledger.debit(customer, credited) {
                warn!(customer, amount = %credited, error = %e, "misc credit reversal failed");
            }
        }
        if debited.is_positive() {
            if let Err(e) = self.ledger.credit(customer, debited) {
                warn!(customer, amount = %debited, error = %e, "misc debit reversal failed");
            }
        }
    }

    pub fn cancel_plan(&mut self, plan_id: PlanId, reason: &str) -> Result<()> {
        let mut plan = self.repository.load(plan_id)?;
        plan.cancel(reason, &self.clock)?;
        self.repository.save(&plan)
    }

    pub fn mark_defaulted(&mut self, plan_id: PlanId, reason: &str) -> Result<()> {
        let mut plan = self.repository.load(plan_id)?;
        plan.mark_defaulted(reason, &self.clock)?;
        self.repository.save(&plan)
    }
}
