pub mod amortization;
pub mod reconciliation;
pub mod status;

pub use amortization::{add_months, calculate_emi, AmortizationSchedule, RepaymentEntry};
pub use reconciliation::{apply_payment, PaymentReconciler, PaymentResult};
pub use status::{classify_statuses, count_paid, next_due_date};
