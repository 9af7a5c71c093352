//! Urgency alert model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The offer expires within the urgency window.
    Urgent,
    /// The offer appeared since the previous scan.
    NewDeal,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Urgent => write!(f, "urgent"),
            AlertKind::NewDeal => write!(f, "new_deal"),
        }
    }
}

/// An alert about one offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UrgencyAlert {
    pub kind: AlertKind,
    pub offer_id: Uuid,
    pub offer_title: String,
    pub business_name: String,
    pub category: String,
    pub discount_label: String,
    pub expires_at: DateTime<Utc>,
    pub minutes_left: i64,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}
