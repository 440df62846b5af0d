use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::{PlanError, Result};
use crate::types::{EntryStatus, PaymentSource, SettlementStatus};

use super::amortization::RepaymentEntry;

/// outcome of applying one payment to one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub installment_no: u32,
    pub source: PaymentSource,
    pub status: SettlementStatus,
    /// amount submitted by the caller
    pub amount: Money,
    /// portion recorded against the entry
    pub applied: Money,
    /// still owed on the entry, zero once paid
    pub remaining_for_entry: Money,
    /// submitted beyond what was owed; the caller credits it externally
    pub overpayment: Money,
}

/// applies payments to schedule entries
#[derive(Debug, Clone, Copy)]
pub struct PaymentReconciler {
    tolerance: Money,
}

impl Default for PaymentReconciler {
    fn default() -> Self {
        Self::new(Money::CENT)
    }
}

impl PaymentReconciler {
    /// `tolerance` is how far short of the emi an entry may be and still count as paid
    pub fn new(tolerance: Money) -> Self {
        Self { tolerance }
    }

    /// apply a payment, returning the updated copy of the entry
    ///
    /// All checks run before anything is computed, so a failed call leaves the
    /// caller's entry exactly as it was.
    pub fn apply(
        &self,
        entry: &RepaymentEntry,
        amount: Money,
        source: PaymentSource,
        today: NaiveDate,
    ) -> Result<(RepaymentEntry, PaymentResult)> {
        self.validate(entry, amount, source)?;

        let owed = entry.owed();
        let applied = amount.min(owed);

        let mut updated = entry.clone();
        match source {
            PaymentSource::Cash => updated.actual_paid_amount += applied,
            PaymentSource::MiscBalance { .. } => updated.misc_adjusted_amount += applied,
        }

        let covered = updated.covered();
        let (status, remaining_for_entry, overpayment) =
            if covered >= updated.emi_amount - self.tolerance {
                (SettlementStatus::Paid, Money::ZERO, amount - applied)
            } else {
                (SettlementStatus::Partial, updated.emi_amount - covered, Money::ZERO)
            };

        updated.status = status.into();
        updated.paid_date = Some(today);

        debug!(
            installment = entry.installment_no,
            amount = %amount,
            applied = %applied,
            overpayment = %overpayment,
            status = ?status,
            "payment applied to installment"
        );

        let result = PaymentResult {
            installment_no: entry.installment_no,
            source,
            status,
            amount,
            applied,
            remaining_for_entry,
            overpayment,
        };

        Ok((updated, result))
    }

    /// what `apply` would do, without producing an updated entry
    pub fn preview(
        &self,
        entry: &RepaymentEntry,
        amount: Money,
        source: PaymentSource,
        today: NaiveDate,
    ) -> Result<PaymentResult> {
        self.apply(entry, amount, source, today).map(|(_, result)| result)
    }

    fn validate(&self, entry: &RepaymentEntry, amount: Money, source: PaymentSource) -> Result<()> {
        if !amount.is_positive() {
            return Err(PlanError::InvalidPaymentAmount { amount });
        }

        if !entry.status.accepts_payment() {
            return Err(PlanError::InvalidPaymentTarget {
                installment_no: entry.installment_no,
                status: entry.status,
            });
        }

        if !entry.owed().is_positive() {
            return Err(PlanError::AlreadySettled {
                installment_no: entry.installment_no,
            });
        }

        if let PaymentSource::MiscBalance { available } = source {
            if amount > available {
                return Err(PlanError::InsufficientMiscBalance {
                    available,
                    requested: amount,
                });
            }
        }

        Ok(())
    }
}

/// apply a payment with the default one-cent settle tolerance
pub fn apply_payment(
    entry: &RepaymentEntry,
    amount: Money,
    source: PaymentSource,
    today: NaiveDate,
) -> Result<(RepaymentEntry, PaymentResult)> {
    PaymentReconciler::default().apply(entry, amount, source, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    fn entry(emi: i64, status: EntryStatus) -> RepaymentEntry {
        RepaymentEntry {
            installment_no: 3,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            emi_amount: Money::from_major(emi),
            principal: Money::from_major(emi),
            interest: Money::ZERO,
            balance: Money::ZERO,
            actual_paid_amount: Money::ZERO,
            misc_adjusted_amount: Money::ZERO,
            status,
            paid_date: None,
        }
    }

    #[test]
    fn test_partial_then_overpaid() {
        let due = entry(5_000, EntryStatus::Due);

        let (after_first, first) =
            apply_payment(&due, Money::from_major(3_000), PaymentSource::Cash, today()).unwrap();
        assert_eq!(first.status, SettlementStatus::Partial);
        assert_eq!(first.remaining_for_entry, Money::from_major(2_000));
        assert_eq!(first.overpayment, Money::ZERO);
        assert_eq!(after_first.status, EntryStatus::Partial);
        assert_eq!(after_first.paid_date, Some(today()));

        let (after_second, second) =
            apply_payment(&after_first, Money::from_major(2_500), PaymentSource::Cash, today())
                .unwrap();
        assert_eq!(second.status, SettlementStatus::Paid);
        assert_eq!(second.applied, Money::from_major(2_000));
        assert_eq!(second.overpayment, Money::from_major(500));
        assert_eq!(second.remaining_for_entry, Money::ZERO);
        assert_eq!(after_second.actual_paid_amount, Money::from_major(5_000));
        assert_eq!(after_second.status, EntryStatus::Paid);
    }

    #[test]
    fn test_exact_owed_settles_without_overpayment() {
        let mut partial = entry(5_000, EntryStatus::Partial);
        partial.actual_paid_amount = Money::from_str_exact("1234.56").unwrap();
        partial.misc_adjusted_amount = Money::from_major(100);

        let owed = partial.owed();
        let (_, result) = apply_payment(&partial, owed, PaymentSource::Cash, today()).unwrap();
        assert_eq!(result.status, SettlementStatus::Paid);
        assert_eq!(result.overpayment, Money::ZERO);
        assert_eq!(result.applied, owed);
    }

    #[test]
    fn test_within_tolerance_counts_as_paid() {
        let due = entry(5_000, EntryStatus::Overdue);
        let short_by_a_cent = Money::from_major(5_000) - Money::CENT;

        let (updated, result) =
            apply_payment(&due, short_by_a_cent, PaymentSource::Cash, today()).unwrap();
        assert_eq!(result.status, SettlementStatus::Paid);
        assert_eq!(updated.status, EntryStatus::Paid);

        let strict = PaymentReconciler::new(Money::ZERO);
        let result = strict
            .preview(&due, short_by_a_cent, PaymentSource::Cash, today())
            .unwrap();
        assert_eq!(result.status, SettlementStatus::Partial);
        assert_eq!(result.remaining_for_entry, Money::CENT);
    }

    #[test]
    fn test_conservation() {
        let due = entry(5_000, EntryStatus::Due);
        for amount in [1, 2_500, 4_999, 5_000, 5_001, 12_000] {
            let amount = Money::from_major(amount);
            let (_, result) = apply_payment(&due, amount, PaymentSource::Cash, today()).unwrap();
            assert_eq!(result.applied + result.overpayment, amount);
        }
    }

    #[test]
    fn test_misc_balance_recorded_separately() {
        let due = entry(5_000, EntryStatus::Due);
        let source = PaymentSource::MiscBalance {
            available: Money::from_major(800),
        };

        let (updated, result) =
            apply_payment(&due, Money::from_major(800), source, today()).unwrap();
        assert_eq!(updated.misc_adjusted_amount, Money::from_major(800));
        assert_eq!(updated.actual_paid_amount, Money::ZERO);
        assert_eq!(result.remaining_for_entry, Money::from_major(4_200));
    }

    #[test]
    fn test_misc_balance_cannot_exceed_available() {
        let due = entry(5_000, EntryStatus::Due);
        let source = PaymentSource::MiscBalance {
            available: Money::from_major(800),
        };

        let err = apply_payment(&due, Money::from_major(900), source, today()).unwrap_err();
        assert_eq!(
            err,
            PlanError::InsufficientMiscBalance {
                available: Money::from_major(800),
                requested: Money::from_major(900),
            }
        );
    }

    #[test]
    fn test_rejects_bad_amount() {
        let due = entry(5_000, EntryStatus::Due);
        for amount in [Money::ZERO, Money::ZERO - Money::from_major(5)] {
            assert!(matches!(
                apply_payment(&due, amount, PaymentSource::Cash, today()),
                Err(PlanError::InvalidPaymentAmount { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_upcoming_and_paid() {
        for status in [EntryStatus::Upcoming, EntryStatus::Paid] {
            let target = entry(5_000, status);
            let err = apply_payment(&target, Money::from_major(10), PaymentSource::Cash, today())
                .unwrap_err();
            assert_eq!(
                err,
                PlanError::InvalidPaymentTarget {
                    installment_no: 3,
                    status,
                }
            );
        }
    }

    #[test]
    fn test_covered_entry_is_already_settled() {
        let mut stale = entry(5_000, EntryStatus::Partial);
        stale.actual_paid_amount = Money::from_major(5_000);

        let err = apply_payment(&stale, Money::from_major(10), PaymentSource::Cash, today())
            .unwrap_err();
        assert_eq!(err, PlanError::AlreadySettled { installment_no: 3 });
    }

    #[test]
    fn test_failed_payment_leaves_entry_untouched() {
        let due = entry(5_000, EntryStatus::Upcoming);
        let before = due.clone();
        let _ = apply_payment(&due, Money::from_major(10), PaymentSource::Cash, today());
        assert_eq!(due, before);
    }
}
