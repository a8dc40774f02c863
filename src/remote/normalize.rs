//! Conversion of loosely-typed remote documents into records.
//!
//! Remote documents are edited by hand and by older clients, so nothing is
//! rejected wholesale: every field is read independently and falls back to
//! a safe default when missing or malformed.

use crate::domain::{
    ChecklistItem, Client, ClientId, ClientStatus, Deal, DealId, DealStage, Project, ProjectId,
    ProjectStatus, Task, TaskId, TaskPriority, TaskStatus, TeamMember,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

/// Field access on a document that may not be an object at all
struct Fields<'a>(Option<&'a serde_json::Map<String, Value>>);

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Self {
        Self(value.as_object())
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|map| map.get(key)).filter(|v| !v.is_null())
    }

    fn text(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(scalar_text)
            .unwrap_or_else(|| default.to_string())
    }

    fn optional_text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    fn parsed<T: FromStr + Default>(&self, key: &str) -> T {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
    }

    fn percentage(&self, key: &str) -> u8 {
        self.number(key)
            .map(|n| n.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0)
    }

    fn strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scalar_text).collect())
            .unwrap_or_default()
    }

    fn objects(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn date(&self, key: &str) -> Option<NaiveDate> {
        self.get(key).and_then(Value::as_str).and_then(parse_date)
    }

    fn timestamp(&self, key: &str) -> DateTime<Utc> {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// Parses `YYYY-MM-DD`, also accepting the date part of an RFC 3339 timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Builds a task from a remote document.
///
/// Unknown status falls back to todo, unknown priority to medium, and a
/// missing or malformed due date to `today`.
pub fn normalize_task(id: &str, data: &Value, today: NaiveDate) -> Task {
    let fields = Fields::of(data);
    let task_id = TaskId::new(id);

    let checklist = fields
        .objects("checklist")
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let item = Fields::of(raw);
            let label = item.text("label", "Item");
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(|| ChecklistItem::derived_id(&task_id, index, &label));
            ChecklistItem {
                id,
                label,
                completed: truthy(item.get("completed")),
            }
        })
        .collect();

    Task {
        title: fields.text("title", "Untitled"),
        description: fields.text("description", ""),
        project_id: ProjectId::new(fields.text("projectId", "")),
        owner: fields.text("owner", "Team"),
        due_date: fields.date("dueDate").unwrap_or(today),
        status: fields.parsed::<TaskStatus>("status"),
        priority: fields.parsed::<TaskPriority>("priority"),
        tags: fields.strings("tags"),
        checklist,
        id: task_id,
    }
}

/// Builds a project from a remote document; unknown status falls back to planning
pub fn normalize_project(id: &str, data: &Value) -> Project {
    let fields = Fields::of(data);

    Project {
        id: ProjectId::new(id),
        name: fields.text("name", "Project"),
        description: fields.text("description", ""),
        status: fields.parsed::<ProjectStatus>("status"),
        due_date: fields.date("dueDate"),
        progress: fields.percentage("progress"),
        client: fields.text("client", ""),
        owner: fields.text("owner", ""),
        team: fields
            .objects("team")
            .iter()
            .map(|raw| {
                let member = Fields::of(raw);
                TeamMember::new(member.text("name", "Member"), member.text("role", "Role"))
            })
            .collect(),
        color: fields.text("color", Project::DEFAULT_COLOR),
    }
}

/// Builds a deal from a remote document; unknown stage falls back to prospecting
pub fn normalize_deal(id: &str, data: &Value) -> Deal {
    let fields = Fields::of(data);

    Deal {
        id: DealId::new(id),
        title: fields.text("title", "Untitled"),
        client_id: ClientId::new(fields.text("clientId", "")),
        value: fields.number("value").unwrap_or(0.0),
        stage: fields.parsed::<DealStage>("stage"),
        owner: fields.text("owner", ""),
        probability: fields.percentage("probability"),
        tags: fields.strings("tags").into_iter().collect(),
        updated_at: fields.timestamp("updatedAt"),
        due_date: fields.date("dueDate"),
        description: fields.optional_text("description"),
    }
}

/// Builds a client from a remote document; unknown status falls back to potential
pub fn normalize_client(id: &str, data: &Value) -> Client {
    let fields = Fields::of(data);

    Client {
        id: ClientId::new(id),
        name: fields.text("name", ""),
        company: fields.text("company", ""),
        email: fields.text("email", ""),
        phone: fields.text("phone", ""),
        status: fields.parsed::<ClientStatus>("status"),
        deals: fields.strings("deals").into_iter().map(DealId::new).collect(),
        created_at: fields.timestamp("createdAt"),
        industry: fields.optional_text("industry"),
        notes: fields.optional_text("notes"),
    }
}
