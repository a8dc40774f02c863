use crate::domain::client::ClientId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

record_id!(
    /// Unique identifier for a deal (e.g., deal-1)
    DealId
);

/// Phase of the sales pipeline a deal sits in.
///
/// Variants are declared in pipeline order, which is also the column order
/// of the deal board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DealStage {
    #[default]
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl DealStage {
    /// All stages in pipeline order
    pub const ALL: [DealStage; 6] = [
        DealStage::Prospecting,
        DealStage::Qualification,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::Won,
        DealStage::Lost,
    ];

    /// Wire and storage name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prospecting => "prospecting",
            Self::Qualification => "qualification",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Whether the deal has left the open pipeline
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prospecting => write!(f, "Prospecting"),
            Self::Qualification => write!(f, "Qualification"),
            Self::Proposal => write!(f, "Proposal"),
            Self::Negotiation => write!(f, "Negotiation"),
            Self::Won => write!(f, "Won"),
            Self::Lost => write!(f, "Lost"),
        }
    }
}

impl FromStr for DealStage {
    type Err = crate::error::NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::error::NexusError::InvalidValue {
                field: "stage",
                value: s.to_string(),
            })
    }
}

/// A sales opportunity tracked on the deal board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    pub client_id: ClientId,
    pub value: f64,
    pub stage: DealStage,
    pub owner: String,
    pub probability: u8,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Deal {
    pub const MAX_PROBABILITY: u8 = 100;

    /// Creates a new deal in the prospecting stage
    pub fn new(id: DealId, title: String, client_id: ClientId, value: f64) -> Self {
        Self {
            id,
            title,
            client_id,
            value,
            stage: DealStage::default(),
            owner: String::new(),
            probability: 0,
            tags: BTreeSet::new(),
            updated_at: Utc::now(),
            due_date: None,
            description: None,
        }
    }

    /// Sets the win probability, clamped to 0..=100
    pub fn set_probability(&mut self, probability: u8) {
        self.probability = probability.min(Self::MAX_PROBABILITY);
        self.updated_at = Utc::now();
    }

    /// Moves the deal record into another stage
    pub fn set_stage(&mut self, stage: DealStage) {
        self.stage = stage;
        self.updated_at = Utc::now();
    }

    /// Value weighted by the win probability
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parsing() {
        assert_eq!(DealStage::from_str("won").unwrap(), DealStage::Won);
        assert_eq!(
            DealStage::from_str(" Negotiation ").unwrap(),
            DealStage::Negotiation
        );
        assert!(DealStage::from_str("closed").is_err());
    }

    #[test]
    fn test_stage_order_follows_pipeline() {
        let mut stages = vec![DealStage::Lost, DealStage::Prospecting, DealStage::Won];
        stages.sort();
        assert_eq!(
            stages,
            vec![DealStage::Prospecting, DealStage::Won, DealStage::Lost]
        );
        assert!(DealStage::Won.is_closed());
        assert!(!DealStage::Proposal.is_closed());
    }

    #[test]
    fn test_probability_is_clamped() {
        let mut deal = Deal::new(DealId::from("d1"), "Deal".into(), ClientId::from("c1"), 1000.0);
        deal.set_probability(150);
        assert_eq!(deal.probability, 100);

        deal.set_probability(40);
        assert_eq!(deal.weighted_value(), 400.0);
    }

    #[test]
    fn test_set_stage_updates_timestamp() {
        let mut deal = Deal::new(DealId::from("d1"), "Deal".into(), ClientId::from("c1"), 10.0);
        let before = deal.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));
        deal.set_stage(DealStage::Proposal);

        assert_eq!(deal.stage, DealStage::Proposal);
        assert!(deal.updated_at > before);
    }

    #[test]
    fn test_deal_serialization_uses_camel_case() {
        let deal = Deal::new(DealId::from("d1"), "Deal".into(), ClientId::from("c1"), 10.0);
        let json = serde_json::to_value(&deal).unwrap();

        assert_eq!(json["clientId"], "c1");
        assert_eq!(json["stage"], "prospecting");
        assert!(json.get("dueDate").is_none());
    }

    #[test]
    fn test_deal_id_rejects_path_separators() {
        assert!(DealId::from_str("deals/d1").is_err());
        assert!(DealId::from_str("   ").is_err());
        assert_eq!(DealId::from_str(" d1 ").unwrap().as_str(), "d1");
    }
}
