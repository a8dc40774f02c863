use crate::domain::project::ProjectId;
use crate::error::NexusError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

record_id!(
    /// Unique identifier for a task (e.g., task-1)
    TaskId
);

/// Status of a task on the task board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Wire and storage name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Todo => write!(f, "To Do"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Review => write!(f, "Review"),
            Self::Done => write!(f, "Done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| NexusError::InvalidValue {
                field: "task status",
                value: s.to_string(),
            })
    }
}

/// Priority of a task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(NexusError::InvalidValue {
                field: "task priority",
                value: s.to_string(),
            }),
        }
    }
}

/// One entry of a task checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Stable synthetic id; nil until assigned by [`Task::ensure_checklist_ids`]
    #[serde(default)]
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    /// Creates an open item with a fresh random id
    pub fn new(label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            completed: false,
        }
    }

    /// Deterministic id for an item that arrived without one.
    ///
    /// The same task, position and label always yield the same id, so
    /// repeated reads of an unchanged remote record compare equal.
    pub fn derived_id(task_id: &TaskId, index: usize, label: &str) -> Uuid {
        let name = format!("{}/{}/{}", task_id.as_str(), index, label);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// A unit of project work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project_id: ProjectId,
    pub owner: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

impl Task {
    /// Creates a new task with the given ID and title
    pub fn new(id: TaskId, title: String, project_id: ProjectId, due_date: NaiveDate) -> Self {
        Self {
            id,
            title,
            description: String::new(),
            project_id,
            owner: String::new(),
            due_date,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            tags: Vec::new(),
            checklist: Vec::new(),
        }
    }

    /// Appends an open checklist item and returns its id
    pub fn add_checklist_item(&mut self, label: String) -> Uuid {
        let item = ChecklistItem::new(label);
        let id = item.id;
        self.checklist.push(item);
        id
    }

    /// Assigns derived ids to checklist items that have none
    pub fn ensure_checklist_ids(&mut self) {
        for (index, item) in self.checklist.iter_mut().enumerate() {
            if item.id.is_nil() {
                item.id = ChecklistItem::derived_id(&self.id, index, &item.label);
            }
        }
    }

    /// Flips the first checklist item whose label matches.
    ///
    /// Labels are not unique: when two items share a label only the first
    /// one is toggled.
    pub fn toggle_checklist_item(&mut self, label: &str) -> Result<&ChecklistItem, NexusError> {
        let item = self
            .checklist
            .iter_mut()
            .find(|item| item.label == label)
            .ok_or_else(|| NexusError::ChecklistItemNotFound {
                task: self.id.to_string(),
                item: label.to_string(),
            })?;
        item.toggle();
        Ok(item)
    }

    /// Flips the checklist item with the given synthetic id
    pub fn toggle_checklist_item_by_id(
        &mut self,
        item_id: Uuid,
    ) -> Result<&ChecklistItem, NexusError> {
        let item = self
            .checklist
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| NexusError::ChecklistItemNotFound {
                task: self.id.to_string(),
                item: item_id.to_string(),
            })?;
        item.toggle();
        Ok(item)
    }

    /// Number of completed checklist items
    pub fn checklist_completed(&self) -> usize {
        self.checklist.iter().filter(|item| item.completed).count()
    }

    /// Fraction of the checklist that is completed, 0.0 for an empty checklist
    pub fn checklist_progress(&self) -> f64 {
        if self.checklist.is_empty() {
            return 0.0;
        }
        self.checklist_completed() as f64 / self.checklist.len() as f64
    }

    /// Open task whose due date is before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date < today
    }
}
