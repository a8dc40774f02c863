use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

record_id!(
    /// Unique identifier for a project (e.g., project-1)
    ProjectId
);

/// Delivery status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Paused,
    Delivered,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning => write!(f, "Planning"),
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = crate::error::NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "delivered" => Ok(Self::Delivered),
            _ => Err(crate::error::NexusError::InvalidValue {
                field: "project status",
                value: s.to_string(),
            }),
        }
    }
}

/// A person assigned to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub progress: u8,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    pub color: String,
}

impl Project {
    pub const DEFAULT_COLOR: &'static str = "#2563eb";

    pub fn new(id: ProjectId, name: String) -> Self {
        Self {
            id,
            name,
            description: String::new(),
            status: ProjectStatus::default(),
            due_date: None,
            progress: 0,
            client: String::new(),
            owner: String::new(),
            team: Vec::new(),
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }

    /// Sets progress, clamped to 0..=100
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }
}
