pub mod clock;
pub mod collaborators;
pub mod config;
pub mod decimal;
pub mod desk;
pub mod errors;
pub mod events;
pub mod plan;
pub mod schedule;
pub mod serialization;
pub mod types;

// re-export key types
pub use clock::Clock;
pub use collaborators::{InMemoryMiscLedger, InMemoryPlanRepository, MiscBalanceLedger, PlanRepository};
pub use config::{PlanConfig, PlanTerms, ReconciliationConfig};
pub use decimal::{Money, Rate};
pub use desk::{InstallmentDesk, PaymentReceipt};
pub use errors::{PlanError, Result};
pub use events::{Event, EventStore};
pub use plan::{InstallmentPlan, InstallmentPlanBuilder};
pub use schedule::{
    apply_payment, classify_statuses, AmortizationSchedule, PaymentReconciler, PaymentResult,
    RepaymentEntry,
};
pub use serialization::PlanView;
pub use types::{EntryStatus, PaymentSource, PlanId, PlanStatus, SettlementStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
