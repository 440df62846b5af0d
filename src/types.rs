use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for an installment plan
pub type PlanId = Uuid;

/// plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    /// schedule running, payments accepted
    Active,
    /// every installment paid
    Completed,
    /// written off by the host
    Defaulted,
    /// cancelled by the host
    Cancelled,
}

impl PlanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlanStatus::Active)
    }
}

/// status of a single schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// not yet the current installment
    Upcoming,
    /// the current installment
    Due,
    /// unpaid and older than the current installment
    Overdue,
    /// some amount applied, not fully covered
    Partial,
    /// fully covered
    Paid,
}

impl EntryStatus {
    /// whether a payment may be applied against an entry in this status
    pub fn accepts_payment(&self) -> bool {
        matches!(self, EntryStatus::Due | EntryStatus::Overdue | EntryStatus::Partial)
    }

    /// paid and partial entries keep their status regardless of date
    pub fn is_settling(&self) -> bool {
        matches!(self, EntryStatus::Partial | EntryStatus::Paid)
    }
}

/// where the money for a payment comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    /// cash collected at the counter, recorded on `actual_paid_amount`
    Cash,
    /// customer's pre-existing credit, recorded on `misc_adjusted_amount`
    MiscBalance { available: Money },
}

/// outcome of applying a payment to one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Partial,
    Paid,
}

impl From<SettlementStatus> for EntryStatus {
    fn from(s: SettlementStatus) -> Self {
        match s {
            SettlementStatus::Partial => EntryStatus::Partial,
            SettlementStatus::Paid => EntryStatus::Paid,
        }
    }
}
