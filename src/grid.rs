// Month grid layout for the planner board. The grid spans whole months,
// weeks run Monday-first, and weeks that fall entirely outside the calendar
// range are compacted to a single line.
use crate::model::validate::{DayClass, DropPolicy};
use chrono::{Datelike, Days, NaiveDate};

/// Badge text injected into blocked day cells.
pub const BLOCKED_BADGE: &str = "Holiday";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub class: DayClass,
    pub badge: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    pub days: Vec<DayCell>,
    /// True when no day of this week falls inside the calendar range; such
    /// rows render collapsed.
    pub compact: bool,
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// First day after the range. Comparisons against the layout use
    /// `date < end_exclusive`, never `<=`.
    pub end_exclusive: NaiveDate,
    pub weeks: Vec<WeekRow>,
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).unwrap_or(date)
}

impl MonthGrid {
    /// Lays out every week from the Monday on or before the first of the
    /// start month through the Sunday of the end month's last week.
    pub fn build(policy: &DropPolicy) -> Self {
        let start = policy.start;
        let end = policy.end;
        let end_exclusive = end.checked_add_days(Days::new(1)).unwrap_or(end);

        let mut cursor = week_start(first_of_month(start));
        let last = last_of_month(end);
        let mut weeks = Vec::new();

        while cursor <= last {
            let mut days = Vec::with_capacity(7);
            for offset in 0..7 {
                let date = cursor + Days::new(offset);
                days.push(DayCell {
                    date,
                    class: policy.classify(date),
                    badge: None,
                });
            }
            weeks.push(WeekRow {
                days,
                compact: false,
            });
            cursor = cursor + Days::new(7);
        }

        let mut grid = Self {
            start,
            end,
            end_exclusive,
            weeks,
        };
        for date in policy.blocked_dates() {
            grid.mount_day(date);
        }
        grid.recompute_compaction();
        grid
    }

    fn cell_mut(&mut self, date: NaiveDate) -> Option<&mut DayCell> {
        let origin = self.weeks.first()?.days.first()?.date;
        let offset = date.signed_duration_since(origin).num_days();
        if offset < 0 {
            return None;
        }
        let week = (offset / 7) as usize;
        let day = (offset % 7) as usize;
        self.weeks.get_mut(week)?.days.get_mut(day)
    }

    /// Marks a cell as blocked and injects its badge. Idempotent: calling
    /// it again for the same date leaves one badge in place.
    pub fn mount_day(&mut self, date: NaiveDate) {
        if let Some(cell) = self.cell_mut(date) {
            cell.class = DayClass::Blocked;
            if cell.badge.is_none() {
                cell.badge = Some(BLOCKED_BADGE);
            }
        }
    }

    /// A week is compact when none of its days fall inside the range.
    pub fn recompute_compaction(&mut self) {
        let (start, end_exclusive) = (self.start, self.end_exclusive);
        for week in &mut self.weeks {
            week.compact = !week
                .days
                .iter()
                .any(|d| d.date >= start && d.date < end_exclusive);
        }
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .find(|c| c.date == date)
    }
}
