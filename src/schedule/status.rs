use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::types::EntryStatus;

use super::amortization::RepaymentEntry;

/// reclassify unsettled entries relative to `today`
///
/// The pivot is the latest entry whose due date has been reached, or the
/// first entry when none has. Unsettled entries before the pivot are
/// `Overdue`, the pivot is `Due` if it is still unsettled, and later ones are
/// `Upcoming`. Paid and partial entries keep their status. The pivot only
/// moves forward with the date, so an entry never goes back from overdue to
/// due or from due to upcoming.
pub fn classify_statuses(entries: &mut [RepaymentEntry], today: NaiveDate) {
    let pivot = entries
        .iter()
        .rposition(|e| e.due_date <= today)
        .unwrap_or(0);

    for (idx, entry) in entries.iter_mut().enumerate() {
        if entry.status.is_settling() {
            continue;
        }
        entry.status = match idx.cmp(&pivot) {
            Ordering::Less => EntryStatus::Overdue,
            Ordering::Equal => EntryStatus::Due,
            Ordering::Greater => EntryStatus::Upcoming,
        };
    }
}

/// entries fully covered
pub fn count_paid(entries: &[RepaymentEntry]) -> u32 {
    entries
        .iter()
        .filter(|e| e.status == EntryStatus::Paid)
        .count() as u32
}

/// due date of the earliest entry not yet paid
pub fn next_due_date(entries: &[RepaymentEntry]) -> Option<NaiveDate> {
    entries
        .iter()
        .find(|e| e.status != EntryStatus::Paid)
        .map(|e| e.due_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::schedule::AmortizationSchedule;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entries(today: NaiveDate) -> Vec<RepaymentEntry> {
        // due on the 15th of Feb..Jul 2025
        AmortizationSchedule::generate(
            Money::from_major(6_000),
            Money::ZERO,
            Rate::ZERO,
            6,
            ymd(2025, 1, 15),
            today,
        )
        .unwrap()
        .entries
    }

    fn statuses(entries: &[RepaymentEntry]) -> Vec<EntryStatus> {
        entries.iter().map(|e| e.status).collect()
    }

    #[test]
    fn test_before_first_due_date() {
        let entries = entries(ymd(2025, 1, 20));
        assert_eq!(entries[0].status, EntryStatus::Due);
        assert!(entries[1..].iter().all(|e| e.status == EntryStatus::Upcoming));
    }

    #[test]
    fn test_due_on_the_day() {
        let entries = entries(ymd(2025, 2, 15));
        assert_eq!(entries[0].status, EntryStatus::Due);
        assert_eq!(entries[1].status, EntryStatus::Upcoming);
    }

    #[test]
    fn test_missed_installments_become_overdue() {
        let entries = entries(ymd(2025, 4, 20));
        assert_eq!(
            statuses(&entries),
            vec![
                EntryStatus::Overdue,
                EntryStatus::Overdue,
                EntryStatus::Due,
                EntryStatus::Upcoming,
                EntryStatus::Upcoming,
                EntryStatus::Upcoming,
            ]
        );
    }

    #[test]
    fn test_settled_entries_keep_status() {
        let mut entries = entries(ymd(2025, 1, 20));
        entries[0].status = EntryStatus::Paid;
        entries[1].status = EntryStatus::Partial;

        classify_statuses(&mut entries, ymd(2025, 5, 1));

        assert_eq!(
            statuses(&entries),
            vec![
                EntryStatus::Paid,
                EntryStatus::Partial,
                EntryStatus::Due,
                EntryStatus::Upcoming,
                EntryStatus::Upcoming,
                EntryStatus::Upcoming,
            ]
        );
    }

    #[test]
    fn test_at_most_one_due() {
        let mut entries = entries(ymd(2025, 1, 1));
        let mut day = ymd(2025, 1, 1);
        while day < ymd(2025, 9, 1) {
            classify_statuses(&mut entries, day);
            let due: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.status == EntryStatus::Due)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(due.len(), 1);
            assert!(entries[..due[0]]
                .iter()
                .all(|e| e.status == EntryStatus::Overdue));
            assert!(entries[due[0] + 1..]
                .iter()
                .all(|e| e.status == EntryStatus::Upcoming));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_everything_paid() {
        let mut entries = entries(ymd(2025, 1, 20));
        for e in entries.iter_mut() {
            e.status = EntryStatus::Paid;
        }
        classify_statuses(&mut entries, ymd(2026, 1, 1));
        assert_eq!(count_paid(&entries), 6);
        assert_eq!(next_due_date(&entries), None);
    }

    #[test]
    fn test_next_due_date_skips_paid() {
        let mut entries = entries(ymd(2025, 1, 20));
        entries[0].status = EntryStatus::Paid;
        assert_eq!(next_due_date(&entries), Some(ymd(2025, 3, 15)));
        assert_eq!(count_paid(&entries), 1);
    }

    #[test]
    fn test_paying_current_keeps_arrears_overdue() {
        let mut entries = entries(ymd(2025, 4, 20));
        entries[2].status = EntryStatus::Paid;

        classify_statuses(&mut entries, ymd(2025, 4, 20));

        assert_eq!(
            statuses(&entries[..4]),
            vec![
                EntryStatus::Overdue,
                EntryStatus::Overdue,
                EntryStatus::Paid,
                EntryStatus::Upcoming,
            ]
        );
    }

    #[test]
    fn test_paid_in_advance_leaves_next_upcoming() {
        let mut entries = entries(ymd(2025, 1, 20));
        entries[0].status = EntryStatus::Paid;

        classify_statuses(&mut entries, ymd(2025, 2, 20));

        assert_eq!(entries[1].status, EntryStatus::Upcoming);
        assert!(entries.iter().all(|e| e.status != EntryStatus::Due));

        classify_statuses(&mut entries, ymd(2025, 3, 15));
        assert_eq!(entries[1].status, EntryStatus::Due);
    }

    #[test]
    fn test_statuses_only_move_forward() {
        fn rank(status: EntryStatus) -> u8 {
            match status {
                EntryStatus::Upcoming => 0,
                EntryStatus::Due => 1,
                EntryStatus::Overdue | EntryStatus::Partial => 2,
                EntryStatus::Paid => 3,
            }
        }

        let mut entries = entries(ymd(2025, 1, 1));
        let mut day = ymd(2025, 1, 1);
        while day < ymd(2025, 9, 1) {
            let before = statuses(&entries);
            classify_statuses(&mut entries, day);
            for (old, new) in before.iter().zip(statuses(&entries)) {
                assert!(rank(new) >= rank(*old), "{:?} -> {:?} on {}", old, new, day);
            }

            // settle whichever entry is due on the 20th of odd months
            if day.day() == 20 && day.month() % 2 == 1 {
                if let Some(due) = entries.iter_mut().find(|e| e.status == EntryStatus::Due) {
                    due.status = EntryStatus::Paid;
                }
            }
            day = day.succ_opt().unwrap();
        }
    }
}
