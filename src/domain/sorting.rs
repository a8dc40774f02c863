use crate::domain::task::{Task, TaskPriority, TaskStatus};
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for sorting tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Status,
    Priority,
    Due,
    Owner,
    ChecklistProgress,
    ChecklistCount,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "title" => Ok(SortField::Title),
            "status" => Ok(SortField::Status),
            "priority" => Ok(SortField::Priority),
            "due" => Ok(SortField::Due),
            "owner" => Ok(SortField::Owner),
            "checklist-progress" => Ok(SortField::ChecklistProgress),
            "checklist-count" => Ok(SortField::ChecklistCount),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: id, title, status, priority, due, owner, checklist-progress, checklist-count",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts tasks in place by the given field and direction.
///
/// The sort is stable, so tasks that compare equal keep their relative
/// order.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use nexus_core::domain::sorting::{sort_tasks, SortField, SortOrder};
/// use nexus_core::domain::{ProjectId, Task, TaskId};
///
/// let due = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
/// let mut tasks = vec![
///     Task::new(TaskId::from("t2"), "Beta".to_string(), ProjectId::from("p"), due),
///     Task::new(TaskId::from("t1"), "alpha".to_string(), ProjectId::from("p"), due),
/// ];
///
/// sort_tasks(&mut tasks, SortField::Title, SortOrder::Ascending);
/// assert_eq!(tasks[0].id.as_str(), "t1");
/// ```
pub fn sort_tasks(tasks: &mut [Task], field: SortField, order: SortOrder) {
    tasks.sort_by(|a, b| {
        let cmp = match field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Status => status_rank(a.status).cmp(&status_rank(b.status)),
            SortField::Priority => compare_priority(a.priority, b.priority),
            SortField::Due => a.due_date.cmp(&b.due_date),
            SortField::Owner => a.owner.to_lowercase().cmp(&b.owner.to_lowercase()),
            SortField::ChecklistProgress => compare_checklist_progress(a, b),
            SortField::ChecklistCount => a.checklist.len().cmp(&b.checklist.len()),
        };

        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

/// Workflow position: Todo → InProgress → Review → Done
fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Review => 2,
        TaskStatus::Done => 3,
    }
}

fn compare_priority(a: TaskPriority, b: TaskPriority) -> Ordering {
    a.cmp(&b)
}

/// Compare by completed fraction; tasks without a checklist rank above any progress
fn compare_checklist_progress(a: &Task, b: &Task) -> Ordering {
    match (a.checklist.is_empty(), b.checklist.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .checklist_progress()
            .partial_cmp(&b.checklist_progress())
            .unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectId;
    use crate::domain::task::TaskId;
    use chrono::NaiveDate;

    fn task(id: &str, title: &str, day: u32) -> Task {
        Task::new(
            TaskId::from(id),
            title.to_string(),
            ProjectId::from("p"),
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        )
    }

    #[test]
    fn test_sort_field_from_str() {
        assert_eq!(SortField::from_str("due").unwrap(), SortField::Due);
        assert_eq!(
            SortField::from_str("CHECKLIST-PROGRESS").unwrap(),
            SortField::ChecklistProgress
        );
        assert!(SortField::from_str("invalid").is_err());
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!(SortOrder::from_str("asc").unwrap(), SortOrder::Ascending);
        assert_eq!(SortOrder::from_str("DESC").unwrap(), SortOrder::Descending);
        assert!(SortOrder::from_str("up").is_err());
    }

    #[test]
    fn test_sort_by_due_date() {
        let mut tasks = vec![task("a", "A", 20), task("b", "B", 10), task("c", "C", 15)];

        sort_tasks(&mut tasks, SortField::Due, SortOrder::Ascending);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        sort_tasks(&mut tasks, SortField::Due, SortOrder::Descending);
        assert_eq!(tasks[0].id.as_str(), "a");
    }

    #[test]
    fn test_sort_by_status_follows_workflow() {
        let mut done = task("done", "A", 1);
        done.status = TaskStatus::Done;
        let mut review = task("review", "B", 1);
        review.status = TaskStatus::Review;
        let todo = task("todo", "C", 1);

        let mut tasks = vec![done, review, todo];
        sort_tasks(&mut tasks, SortField::Status, SortOrder::Ascending);

        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["todo", "review", "done"]);
    }

    #[test]
    fn test_sort_by_priority_descending() {
        let mut high = task("high", "A", 1);
        high.priority = TaskPriority::High;
        let mut low = task("low", "B", 1);
        low.priority = TaskPriority::Low;
        let medium = task("medium", "C", 1);

        let mut tasks = vec![low, medium, high];
        sort_tasks(&mut tasks, SortField::Priority, SortOrder::Descending);

        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "medium", "low"]);
    }

    #[test]
    fn test_sort_by_checklist_progress_puts_empty_last() {
        let mut half = task("half", "A", 1);
        half.add_checklist_item("one".to_string());
        half.add_checklist_item("two".to_string());
        half.toggle_checklist_item("one").unwrap();

        let mut full = task("full", "B", 1);
        full.add_checklist_item("one".to_string());
        full.toggle_checklist_item("one").unwrap();

        let empty = task("empty", "C", 1);

        let mut tasks = vec![empty, full, half];
        sort_tasks(&mut tasks, SortField::ChecklistProgress, SortOrder::Ascending);

        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["half", "full", "empty"]);
    }
}
