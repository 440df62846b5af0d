use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{PaymentSource, PlanId, PlanStatus};

/// all events that can be emitted by a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    PlanCreated {
        plan_id: PlanId,
        customer_id: String,
        financed_amount: Money,
        emi_amount: Money,
        tenure_months: u32,
        date: NaiveDate,
    },
    PlanCompleted {
        plan_id: PlanId,
        final_installment: u32,
        date: NaiveDate,
    },
    StatusChanged {
        plan_id: PlanId,
        old_status: PlanStatus,
        new_status: PlanStatus,
        reason: String,
        date: NaiveDate,
    },

    // payment events
    InstallmentPaid {
        plan_id: PlanId,
        installment_no: u32,
        applied: Money,
        source: PaymentSource,
        date: NaiveDate,
    },
    InstallmentPartiallyPaid {
        plan_id: PlanId,
        installment_no: u32,
        applied: Money,
        remaining: Money,
        source: PaymentSource,
        date: NaiveDate,
    },
    OverpaymentReturned {
        plan_id: PlanId,
        installment_no: u32,
        amount: Money,
        date: NaiveDate,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
