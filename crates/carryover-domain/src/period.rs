//! Period calculation: maps a date onto the cycle window that contains it.
//!
//! Windows are inclusive on both ends and contiguous: the day after one
//! window's `end` is always the next window's `start`.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cycle::{CycleConfig, CycleType};

/// One concrete instance of a budget cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered by the window.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Returns the window of `config`'s cycle that contains `reference`.
pub fn current_period(config: &CycleConfig, reference: NaiveDate) -> PeriodWindow {
    match config.cycle_type {
        CycleType::Day => PeriodWindow::new(reference, reference),
        CycleType::Week => week_period(config.cycle_start_day, reference),
        CycleType::Month => month_period(config.cycle_start_day, reference),
        CycleType::Year => year_period(config.start_date, reference),
    }
}

/// Returns the window immediately before the one starting at `period_start`.
pub fn previous_period(config: &CycleConfig, period_start: NaiveDate) -> PeriodWindow {
    current_period(config, period_start - Duration::days(1))
}

/// Returns the window immediately after `period`.
pub fn next_period(config: &CycleConfig, period: &PeriodWindow) -> PeriodWindow {
    current_period(config, period.end + Duration::days(1))
}

/// Lists every window from `first` through the window starting at `last_start`, oldest first.
///
/// Returns an empty list when `first` starts after `last_start`.
pub fn periods_through(
    config: &CycleConfig,
    first: PeriodWindow,
    last_start: NaiveDate,
) -> Vec<PeriodWindow> {
    let mut periods = Vec::new();
    let mut cursor = first;
    while cursor.start <= last_start {
        periods.push(cursor);
        cursor = next_period(config, &cursor);
    }
    periods
}

fn week_period(cycle_start_day: u32, reference: NaiveDate) -> PeriodWindow {
    let start_day = cycle_start_day.clamp(1, 7) as i64;
    let weekday = reference.weekday().number_from_monday() as i64;
    let adjusted_diff = (weekday - start_day).rem_euclid(7);
    let start = reference - Duration::days(adjusted_diff);
    PeriodWindow::new(start, start + Duration::days(6))
}

fn month_period(cycle_start_day: u32, reference: NaiveDate) -> PeriodWindow {
    let start_day = cycle_start_day.clamp(1, 31);
    let (year, month) = (reference.year(), reference.month());
    let this_start = clamp_day(year, month, start_day);

    if reference.day() >= this_start {
        let (next_year, next_month) = shift_month(year, month, 1);
        let next_start = clamp_day(next_year, next_month, start_day);
        PeriodWindow::new(
            ymd(year, month, this_start),
            ymd(next_year, next_month, next_start) - Duration::days(1),
        )
    } else {
        let (prev_year, prev_month) = shift_month(year, month, -1);
        let prev_start = clamp_day(prev_year, prev_month, start_day);
        PeriodWindow::new(
            ymd(prev_year, prev_month, prev_start),
            ymd(year, month, this_start) - Duration::days(1),
        )
    }
}

fn year_period(anchor: NaiveDate, reference: NaiveDate) -> PeriodWindow {
    let year = reference.year();
    let this_anchor = anchor_in_year(anchor, year);

    if reference >= this_anchor {
        PeriodWindow::new(
            this_anchor,
            anchor_in_year(anchor, year + 1) - Duration::days(1),
        )
    } else {
        PeriodWindow::new(
            anchor_in_year(anchor, year - 1),
            this_anchor - Duration::days(1),
        )
    }
}

/// Places the anchor's month/day in `year`, clamping Feb 29 in common years.
fn anchor_in_year(anchor: NaiveDate, year: i32) -> NaiveDate {
    let month = anchor.month();
    ymd(year, month, clamp_day(year, month, anchor.day()))
}

/// Clamps a configured day to the length of the given month.
pub fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    day.min(days_in_month(year, month))
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = shift_month(year, month, 1);
    let first_next = ymd(next_year, next_month, 1);
    (first_next - Duration::days(1)).day()
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("day is clamped to the month length")
}
