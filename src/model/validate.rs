// Client-side drop admissibility. This is the single predicate shared by
// the assignment coordinator and the grid renderer; the authoritative check
// remains server-side, these exist to avoid round-trips for clearly invalid
// gestures.
use crate::model::ExamCalendar;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::fmt;

/// No exams on the last day of a Monday-first week.
pub const REST_DAY: Weekday = Weekday::Sun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    RestDay,
    OutsideRange,
    BlockedDay,
}

impl DropRejection {
    pub fn message(&self) -> &'static str {
        match self {
            DropRejection::RestDay => "Exams cannot be scheduled on Sundays.",
            DropRejection::OutsideRange => "The date is outside the calendar range.",
            DropRejection::BlockedDay => "The day is blocked as a holiday.",
        }
    }
}

impl fmt::Display for DropRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Visual classification of a grid day cell, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    Blocked,
    OutOfRange,
    Open,
}

/// Range and blocked-day policy for one calendar.
#[derive(Debug, Clone)]
pub struct DropPolicy {
    pub start: NaiveDate,
    pub end: NaiveDate,
    blocked: HashSet<NaiveDate>,
}

impl DropPolicy {
    pub fn new(start: NaiveDate, end: NaiveDate, blocked: HashSet<NaiveDate>) -> Self {
        Self { start, end, blocked }
    }

    pub fn for_calendar(calendar: &ExamCalendar) -> Self {
        let blocked = calendar.blocked_days.iter().map(|b| b.date).collect();
        Self::new(calendar.start_date, calendar.end_date, blocked)
    }

    pub fn is_rest_day(date: NaiveDate) -> bool {
        date.weekday() == REST_DAY
    }

    /// Both bounds inclusive.
    pub fn in_range(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.contains(&date)
    }

    pub fn blocked_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.blocked.iter().copied()
    }

    /// Admissibility of a drop/move target. The rest-day check comes first:
    /// a Sunday is reported as such regardless of range or blocked status.
    pub fn check(&self, date: NaiveDate) -> Result<(), DropRejection> {
        if Self::is_rest_day(date) {
            return Err(DropRejection::RestDay);
        }
        if !self.in_range(date) {
            return Err(DropRejection::OutsideRange);
        }
        if self.is_blocked(date) {
            return Err(DropRejection::BlockedDay);
        }
        Ok(())
    }

    /// Three mutually exclusive visual states: blocked-or-rest-day wins over
    /// out-of-range, which wins over the default.
    pub fn classify(&self, date: NaiveDate) -> DayClass {
        if self.is_blocked(date) || Self::is_rest_day(date) {
            DayClass::Blocked
        } else if !self.in_range(date) {
            DayClass::OutOfRange
        } else {
            DayClass::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DropPolicy {
        let blocked = [NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()]
            .into_iter()
            .collect();
        DropPolicy::new(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            blocked,
        )
    }

    #[test]
    fn open_weekday_in_range_is_admissible() {
        // 2026-02-16 is a Monday.
        let d = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        assert!(policy().check(d).is_ok());
        assert_eq!(policy().classify(d), DayClass::Open);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let p = policy();
        assert!(p.in_range(p.start));
        assert!(p.in_range(p.end));
        assert!(!p.in_range(p.end.succ_opt().unwrap()));
        assert!(!p.in_range(p.start.pred_opt().unwrap()));
    }

    #[test]
    fn outside_range_is_rejected() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(); // a Monday
        assert_eq!(policy().check(d), Err(DropRejection::OutsideRange));
    }

    #[test]
    fn blocked_day_is_rejected_with_specific_reason() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(policy().check(d), Err(DropRejection::BlockedDay));
    }

    #[test]
    fn rest_day_is_rejected_regardless_of_range() {
        // In-range Sunday.
        let in_range = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        assert_eq!(policy().check(in_range), Err(DropRejection::RestDay));
        // Out-of-range Sunday still reports the rest day.
        let out = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(policy().check(out), Err(DropRejection::RestDay));
    }

    #[test]
    fn classification_precedence_blocked_over_out_of_range() {
        let mut blocked = HashSet::new();
        let outside = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        blocked.insert(outside);
        let p = DropPolicy::new(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            blocked,
        );
        assert_eq!(p.classify(outside), DayClass::Blocked);
    }

    #[test]
    fn rejection_messages_are_distinct() {
        let msgs = [
            DropRejection::RestDay.message(),
            DropRejection::OutsideRange.message(),
            DropRejection::BlockedDay.message(),
        ];
        assert_ne!(msgs[0], msgs[1]);
        assert_ne!(msgs[1], msgs[2]);
        assert_ne!(msgs[0], msgs[2]);
    }
}
