use crate::domain::task::{Task, TaskId};
use crate::error::{NexusError, Result};
use chrono::{Datelike, Days, NaiveDate};
use std::{fmt, str::FromStr};

/// Cells in a month view: six Sunday-first weeks
pub const CALENDAR_CELLS: usize = 42;

/// One cell of the month grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    /// Tasks due on this day, sorted by title
    pub tasks: Vec<TaskId>,
}

/// Builds the 42-day grid for a month.
///
/// The grid starts on the Sunday on or before the first of the month.
pub fn month_grid(tasks: &[Task], year: i32, month: u32, today: NaiveDate) -> Result<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| NexusError::InvalidDate(format!("{}-{:02}", year, month)))?;
    let offset = u64::from(first.weekday().num_days_from_sunday());
    let start = first
        .checked_sub_days(Days::new(offset))
        .ok_or_else(|| NexusError::InvalidDate(first.to_string()))?;

    let mut days = Vec::with_capacity(CALENDAR_CELLS);
    for index in 0..CALENDAR_CELLS as u64 {
        let date = start
            .checked_add_days(Days::new(index))
            .ok_or_else(|| NexusError::InvalidDate(start.to_string()))?;

        let mut due: Vec<&Task> = tasks.iter().filter(|task| task.due_date == date).collect();
        due.sort_by_key(|task| task.title.to_lowercase());

        days.push(CalendarDay {
            date,
            in_current_month: date.year() == year && date.month() == month,
            is_today: date == today,
            tasks: due.into_iter().map(|task| task.id.clone()).collect(),
        });
    }
    Ok(days)
}

/// Counters shown above the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarStats {
    /// Open tasks due before today
    pub overdue: usize,
    /// Tasks due in the Sunday-to-Saturday week containing today
    pub this_week: usize,
}

pub fn calendar_stats(tasks: &[Task], today: NaiveDate) -> CalendarStats {
    let offset = u64::from(today.weekday().num_days_from_sunday());
    let week_start = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
    let week_end = week_start.checked_add_days(Days::new(6)).unwrap_or(week_start);

    CalendarStats {
        overdue: tasks.iter().filter(|task| task.is_overdue(today)).count(),
        this_week: tasks
            .iter()
            .filter(|task| task.due_date >= week_start && task.due_date <= week_end)
            .count(),
    }
}

/// Drop target id of a calendar day cell, written as `day:YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayCell(pub NaiveDate);

impl DayCell {
    pub const PREFIX: &'static str = "day:";

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DayCell {
    type Err = NexusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| NexusError::InvalidDate(s.to_string()))?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(DayCell)
            .map_err(|_| NexusError::InvalidDate(s.to_string()))
    }
}

impl fmt::Display for DayCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0.format("%Y-%m-%d"))
    }
}

/// Resolves a task dropped on a calendar cell to its new due date.
///
/// Returns `None` when the drop id is not a day cell, the task is unknown,
/// or the task is already due that day.
pub fn resolve_calendar_drop(tasks: &[Task], task_id: &TaskId, drop_id: &str) -> Option<NaiveDate> {
    let cell: DayCell = drop_id.parse().ok()?;
    let task = tasks.iter().find(|task| &task.id == task_id)?;
    (task.due_date != cell.date()).then_some(cell.date())
}
