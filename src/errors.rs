use thiserror::Error;

use crate::decimal::Money;
use crate::types::{EntryStatus, PlanId, PlanStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("invalid plan parameters: {message}")]
    InvalidPlanParameters {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("installment {installment_no} cannot take a payment while {status:?}")]
    InvalidPaymentTarget {
        installment_no: u32,
        status: EntryStatus,
    },

    #[error("installment {installment_no} already settled")]
    AlreadySettled {
        installment_no: u32,
    },

    #[error("installment not found: {installment_no}")]
    InstallmentNotFound {
        installment_no: u32,
    },

    #[error("plan not active: current status is {status:?}")]
    PlanNotActive {
        status: PlanStatus,
    },

    #[error("plan not found: {id}")]
    PlanNotFound {
        id: PlanId,
    },

    #[error("insufficient misc balance: available {available}, requested {requested}")]
    InsufficientMiscBalance {
        available: Money,
        requested: Money,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl PlanError {
    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        PlanError::InvalidPlanParameters {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
