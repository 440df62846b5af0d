use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{PlanConfig, PlanTerms, ReconciliationConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{PlanError, Result};
use crate::events::{Event, EventStore};
use crate::schedule::{
    classify_statuses, count_paid, next_due_date, AmortizationSchedule, PaymentReconciler,
    PaymentResult, RepaymentEntry,
};
use crate::types::{EntryStatus, PaymentSource, PlanId, PlanStatus, SettlementStatus};

/// installment plan aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub id: PlanId,
    pub customer_id: String,
    pub config: PlanConfig,
    pub schedule: AmortizationSchedule,
    pub status: PlanStatus,
    pub paid_installments: u32,
    pub remaining_installments: u32,
    pub next_due_date: Option<NaiveDate>,
    pub created_on: NaiveDate,
    pub closed_on: Option<NaiveDate>,
    #[serde(default)]
    pub events: EventStore,
}

impl InstallmentPlan {
    pub fn builder() -> InstallmentPlanBuilder {
        InstallmentPlanBuilder::new()
    }

    /// create a plan and its full schedule
    pub fn create(customer_id: impl Into<String>, config: PlanConfig, clock: &impl Clock) -> Result<Self> {
        config.validate()?;

        let today = clock.today();
        let schedule = AmortizationSchedule::from_terms(&config.terms, today)?;
        let id = Uuid::new_v4();
        let customer_id = customer_id.into();

        let mut plan = Self {
            id,
            customer_id,
            config,
            schedule,
            status: PlanStatus::Active,
            paid_installments: 0,
            remaining_installments: 0,
            next_due_date: None,
            created_on: today,
            closed_on: None,
            events: EventStore::new(),
        };
        plan.recompute_aggregates();

        info!(
            plan_id = %plan.id,
            customer = %plan.customer_id,
            financed = %plan.schedule.financed_amount,
            emi = %plan.schedule.emi_amount,
            tenure = plan.schedule.tenure_months,
            "installment plan created"
        );

        plan.events.emit(Event::PlanCreated {
            plan_id: plan.id,
            customer_id: plan.customer_id.clone(),
            financed_amount: plan.schedule.financed_amount,
            emi_amount: plan.schedule.emi_amount,
            tenure_months: plan.schedule.tenure_months,
            date: today,
        });

        Ok(plan)
    }

    pub fn entries(&self) -> &[RepaymentEntry] {
        &self.schedule.entries
    }

    pub fn entry(&self, installment_no: u32) -> Option<&RepaymentEntry> {
        self.schedule.get_entry(installment_no)
    }

    pub fn emi_amount(&self) -> Money {
        self.schedule.emi_amount
    }

    pub fn financed_amount(&self) -> Money {
        self.schedule.financed_amount
    }

    pub fn total_payable(&self) -> Money {
        self.schedule.total_payable
    }

    pub fn total_interest(&self) -> Money {
        self.schedule.total_interest
    }

    /// cash and misc credit applied across the schedule
    pub fn total_paid(&self) -> Money {
        self.schedule.entries.iter().map(|e| e.covered()).sum()
    }

    pub fn total_cash_paid(&self) -> Money {
        self.schedule.entries.iter().map(|e| e.actual_paid_amount).sum()
    }

    pub fn total_misc_adjusted(&self) -> Money {
        self.schedule.entries.iter().map(|e| e.misc_adjusted_amount).sum()
    }

    /// what is still owed across entries not yet paid
    pub fn outstanding_amount(&self) -> Money {
        self.schedule
            .entries
            .iter()
            .filter(|e| e.status != EntryStatus::Paid)
            .map(|e| e.outstanding())
            .sum()
    }

    /// overdue entries as of the last status refresh
    pub fn overdue_count(&self) -> u32 {
        self.schedule
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Overdue)
            .count() as u32
    }

    pub fn overdue_amount(&self) -> Money {
        self.schedule
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Overdue)
            .map(|e| e.outstanding())
            .sum()
    }

    fn reconciler(&self) -> PaymentReconciler {
        PaymentReconciler::new(self.config.reconciliation.settle_tolerance)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(PlanError::PlanNotActive {
                status: self.status,
            });
        }
        Ok(())
    }

    fn entry_index(&self, installment_no: u32) -> Result<usize> {
        self.entry(installment_no)
            .map(|_| (installment_no - 1) as usize)
            .ok_or(PlanError::InstallmentNotFound { installment_no })
    }

    /// reclassify entries against the clock's today
    pub fn refresh_statuses(&mut self, clock: &impl Clock) {
        if self.status.is_terminal() {
            return;
        }
        classify_statuses(&mut self.schedule.entries, clock.today());
        self.recompute_aggregates();
    }

    /// statuses as they would be today, without touching the plan
    fn refreshed_entries(&self, today: NaiveDate) -> Vec<RepaymentEntry> {
        let mut entries = self.schedule.entries.clone();
        classify_statuses(&mut entries, today);
        entries
    }

    /// take a cash payment against an installment
    pub fn pay_installment(
        &mut self,
        installment_no: u32,
        amount: Money,
        clock: &impl Clock,
    ) -> Result<PaymentResult> {
        self.apply(installment_no, amount, PaymentSource::Cash, clock.today())
    }

    /// cover an installment from the customer's misc credit, up to `available`
    ///
    /// Applies `min(available, owed)`; the caller debits `applied` from the ledger.
    pub fn apply_misc_balance(
        &mut self,
        installment_no: u32,
        available: Money,
        clock: &impl Clock,
    ) -> Result<PaymentResult> {
        self.ensure_active()?;
        let idx = self.entry_index(installment_no)?;
        let owed = self.schedule.entries[idx].owed();
        let amount = if owed.is_positive() { available.min(owed) } else { available };

        self.apply(
            installment_no,
            amount,
            PaymentSource::MiscBalance { available },
            clock.today(),
        )
    }

    /// outcome of a payment without applying it
    pub fn preview_payment(
        &self,
        installment_no: u32,
        amount: Money,
        source: PaymentSource,
        clock: &impl Clock,
    ) -> Result<PaymentResult> {
        self.ensure_active()?;
        let idx = self.entry_index(installment_no)?;
        let today = clock.today();
        let entries = self.refreshed_entries(today);
        self.reconciler().preview(&entries[idx], amount, source, today)
    }

    fn apply(
        &mut self,
        installment_no: u32,
        amount: Money,
        source: PaymentSource,
        today: NaiveDate,
    ) -> Result<PaymentResult> {
        self.ensure_active()?;
        let idx = self.entry_index(installment_no)?;

        let mut entries = self.refreshed_entries(today);
        let (updated, result) = self.reconciler().apply(&entries[idx], amount, source, today)?;

        // nothing below can fail; commit
        entries[idx] = updated;
        self.schedule.entries = entries;
        self.recompute_aggregates();
        self.record_payment(&result, today);

        if self.paid_installments == self.schedule.tenure_months {
            self.complete(installment_no, today);
        }

        Ok(result)
    }

    fn record_payment(&mut self, result: &PaymentResult, today: NaiveDate) {
        match result.status {
            SettlementStatus::Paid => self.events.emit(Event::InstallmentPaid {
                plan_id: self.id,
                installment_no: result.installment_no,
                applied: result.applied,
                source: result.source,
                date: today,
            }),
            SettlementStatus::Partial => self.events.emit(Event::InstallmentPartiallyPaid {
                plan_id: self.id,
                installment_no: result.installment_no,
                applied: result.applied,
                remaining: result.remaining_for_entry,
                source: result.source,
                date: today,
            }),
        }

        if result.overpayment.is_positive() {
            info!(
                plan_id = %self.id,
                installment = result.installment_no,
                overpayment = %result.overpayment,
                "overpayment to be credited to misc balance"
            );
            self.events.emit(Event::OverpaymentReturned {
                plan_id: self.id,
                installment_no: result.installment_no,
                amount: result.overpayment,
                date: today,
            });
        }
    }

    fn recompute_aggregates(&mut self) {
        self.paid_installments = count_paid(&self.schedule.entries);
        self.remaining_installments = self
            .schedule
            .tenure_months
            .saturating_sub(self.paid_installments);
        self.next_due_date = next_due_date(&self.schedule.entries);
    }

    fn complete(&mut self, final_installment: u32, today: NaiveDate) {
        info!(plan_id = %self.id, "installment plan completed");
        self.transition(PlanStatus::Completed, "all installments paid", today);
        self.events.emit(Event::PlanCompleted {
            plan_id: self.id,
            final_installment,
            date: today,
        });
    }

    fn transition(&mut self, new_status: PlanStatus, reason: &str, today: NaiveDate) {
        let old_status = self.status;
        self.status = new_status;
        self.closed_on = Some(today);
        self.events.emit(Event::StatusChanged {
            plan_id: self.id,
            old_status,
            new_status,
            reason: reason.to_string(),
            date: today,
        });
    }

    /// cancel an active plan
    pub fn cancel(&mut self, reason: &str, clock: &impl Clock) -> Result<()> {
        self.ensure_active()?;
        warn!(plan_id = %self.id, reason, "installment plan cancelled");
        self.transition(PlanStatus::Cancelled, reason, clock.today());
        Ok(())
    }

    /// mark an active plan as defaulted
    pub fn mark_defaulted(&mut self, reason: &str, clock: &impl Clock) -> Result<()> {
        self.ensure_active()?;
        warn!(plan_id = %self.id, reason, "installment plan defaulted");
        self.transition(PlanStatus::Defaulted, reason, clock.today());
        Ok(())
    }
}

/// builder for installment plans
#[derive(Debug, Default)]
pub struct InstallmentPlanBuilder {
    customer_id: Option<String>,
    base_amount: Option<Money>,
    down_payment: Option<Money>,
    rate: Option<Rate>,
    tenure_months: Option<u32>,
    start_date: Option<NaiveDate>,
    reconciliation: Option<ReconciliationConfig>,
}

impl InstallmentPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_id(mut self, customer: impl Into<String>) -> Self {
        self.customer_id = Some(customer.into());
        self
    }

    pub fn base_amount(mut self, amount: Money) -> Self {
        self.base_amount = Some(amount);
        self
    }

    pub fn down_payment(mut self, amount: Money) -> Self {
        self.down_payment = Some(amount);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    /// annual rate as a percentage, e.g. `dec!(12.5)`
    pub fn rate_percent(mut self, percent: Decimal) -> Self {
        self.rate = Some(Rate::from_percentage_decimal(percent));
        self
    }

    pub fn tenure_months(mut self, months: u32) -> Self {
        self.tenure_months = Some(months);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn reconciliation(mut self, config: ReconciliationConfig) -> Self {
        self.reconciliation = Some(config);
        self
    }

    /// take terms and reconciliation rules from a loaded config
    pub fn config(mut self, config: PlanConfig) -> Self {
        self.base_amount = Some(config.terms.base_amount);
        self.down_payment = Some(config.terms.down_payment);
        self.rate = Some(config.terms.interest_rate);
        self.tenure_months = Some(config.terms.tenure_months);
        self.start_date = Some(config.terms.start_date);
        self.reconciliation = Some(config.reconciliation);
        self
    }

    /// build with the clock's today as start date unless one was set
    pub fn build(self, clock: &impl Clock) -> Result<InstallmentPlan> {
        let missing = |field: &str| PlanError::InvalidConfiguration {
            message: format!("{} is required", field),
        };

        let customer_id = self.customer_id.ok_or_else(|| missing("customer_id"))?;
        let base_amount = self.base_amount.ok_or_else(|| missing("base_amount"))?;
        let tenure_months = self.tenure_months.ok_or_else(|| missing("tenure_months"))?;

        let config = PlanConfig {
            terms: PlanTerms {
                base_amount,
                down_payment: self.down_payment.unwrap_or(Money::ZERO),
                interest_rate: self.rate.unwrap_or(Rate::ZERO),
                tenure_months,
                start_date: self.start_date.unwrap_or_else(|| clock.today()),
            },
            reconciliation: self.reconciliation.unwrap_or_default(),
        };

        InstallmentPlan::create(customer_id, config, clock)
    }
}
