use std::collections::HashMap;

use tracing::debug;

use crate::decimal::Money;
use crate::errors::{PlanError, Result};
use crate::plan::InstallmentPlan;
use crate::types::PlanId;

/// storage for plans, owned by the host
pub trait PlanRepository {
    fn load(&self, id: PlanId) -> Result<InstallmentPlan>;

    fn save(&mut self, plan: &InstallmentPlan) -> Result<()>;
}

/// customer credit ("misc balance") ledger, owned by the host
pub trait MiscBalanceLedger {
    fn balance(&self, customer_id: &str) -> Money;

    fn credit(&mut self, customer_id: &str, amount: Money) -> Result<()>;

    fn debit(&mut self, customer_id: &str, amount: Money) -> Result<()>;
}

/// plan repository backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryPlanRepository {
    plans: HashMap<PlanId, InstallmentPlan>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl PlanRepository for InMemoryPlanRepository {
    fn load(&self, id: PlanId) -> Result<InstallmentPlan> {
        self.plans
            .get(&id)
            .cloned()
            .ok_or(PlanError::PlanNotFound { id })
    }

    fn save(&mut self, plan: &InstallmentPlan) -> Result<()> {
        self.plans.insert(plan.id, plan.clone());
        Ok(())
    }
}

/// misc balance ledger backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryMiscLedger {
    balances: HashMap<String, Money>,
}

impl InMemoryMiscLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// seed a customer's opening balance
    pub fn with_balance(mut self, customer_id: impl Into<String>, amount: Money) -> Self {
        self.balances.insert(customer_id.into(), amount);
        self
    }
}

impl MiscBalanceLedger for InMemoryMiscLedger {
    fn balance(&self, customer_id: &str) -> Money {
        self.balances.get(customer_id).copied().unwrap_or(Money::ZERO)
    }

    fn credit(&mut self, customer_id: &str, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(PlanError::InvalidPaymentAmount { amount });
        }
        let balance = self.balances.entry(customer_id.to_string()).or_default();
        *balance += amount;
        debug!(customer = customer_id, amount = %amount, balance = %balance, "misc balance credited");
        Ok(())
    }

    fn debit(&mut self, customer_id: &str, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(PlanError::InvalidPaymentAmount { amount });
        }
        let available = self.balance(customer_id);
        if amount > available {
            return Err(PlanError::InsufficientMiscBalance {
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        self.balances.insert(customer_id.to_string(), remaining);
        debug!(customer = customer_id, amount = %amount, balance = %remaining, "misc balance debited");
        Ok(())
    }
}
