use crate::domain::deal::DealId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

record_id!(
    /// Unique identifier for a client (e.g., client-1)
    ClientId
);

/// Relationship status of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[serde(alias = "ativo")]
    Active,
    #[default]
    #[serde(alias = "potencial")]
    Potential,
    #[serde(alias = "inativo")]
    Inactive,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Potential => write!(f, "Potential"),
            Self::Inactive => write!(f, "Inactive"),
        }
    }
}

impl FromStr for ClientStatus {
    type Err = crate::error::NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "ativo" => Ok(Self::Active),
            "potential" | "potencial" => Ok(Self::Potential),
            "inactive" | "inativo" => Ok(Self::Inactive),
            _ => Err(crate::error::NexusError::InvalidValue {
                field: "client status",
                value: s.to_string(),
            }),
        }
    }
}

/// A customer account in the CRM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub status: ClientStatus,
    #[serde(default)]
    pub deals: Vec<DealId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Client {
    pub fn new(id: ClientId, name: String, company: String) -> Self {
        Self {
            id,
            name,
            company,
            email: String::new(),
            phone: String::new(),
            status: ClientStatus::default(),
            deals: Vec::new(),
            created_at: Utc::now(),
            industry: None,
            notes: None,
        }
    }

    /// Case-insensitive match against the client's name or company
    pub fn matches(&self, term_lower: &str) -> bool {
        self.name.to_lowercase().contains(term_lower)
            || self.company.to_lowercase().contains(term_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_portuguese_spellings() {
        let status: ClientStatus = serde_json::from_str("\"ativo\"").unwrap();
        assert_eq!(status, ClientStatus::Active);

        assert_eq!(
            ClientStatus::from_str("inativo").unwrap(),
            ClientStatus::Inactive
        );
        assert_eq!(
            serde_json::to_string(&ClientStatus::Potential).unwrap(),
            "\"potential\""
        );
    }

    #[test]
    fn test_client_matches_name_or_company() {
        let client = Client::new(
            ClientId::from("c1"),
            "Ana Ribeiro".to_string(),
            "PixelWave Studio".to_string(),
        );

        assert!(client.matches("pixel"));
        assert!(client.matches("ana"));
        assert!(!client.matches("aurora"));
    }
}
