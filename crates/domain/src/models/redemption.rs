//! Redemption domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted marker for redemptions made without an authenticated identity.
pub const ANONYMOUS_REDEEMER_KIND: &str = "anonymous";

/// Persisted kind for redemptions attributed to an authenticated subject.
pub const USER_REDEEMER_KIND: &str = "user";

/// The party a redemption is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redeemer {
    /// Subject supplied by the identity provider.
    User { subject: String },
    /// No identity was supplied. Stored as an explicit marker, never as a
    /// made-up user.
    Anonymous,
}

impl Redeemer {
    /// Converts to database kind representation.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Redeemer::User { .. } => USER_REDEEMER_KIND,
            Redeemer::Anonymous => ANONYMOUS_REDEEMER_KIND,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Redeemer::User { subject } => Some(subject),
            Redeemer::Anonymous => None,
        }
    }

    /// Rebuilds from the persisted `(kind, subject)` pair.
    pub fn from_parts(kind: &str, subject: Option<String>) -> Option<Self> {
        match (kind, subject) {
            (USER_REDEEMER_KIND, Some(subject)) => Some(Redeemer::User { subject }),
            (ANONYMOUS_REDEEMER_KIND, None) => Some(Redeemer::Anonymous),
            _ => None,
        }
    }
}

/// Immutable record of one successful use of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Redemption {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub redeemer: Redeemer,
    pub redeemed_at: DateTime<Utc>,
}

/// Confirmation returned to the scanner. Title and business name are a
/// display snapshot, not re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RedemptionReceipt {
    pub redemption_id: Uuid,
    pub offer_id: Uuid,
    pub offer_title: String,
    pub business_name: String,
    pub redeemed_at: DateTime<Utc>,
    pub remaining_capacity: i32,
}

impl RedemptionReceipt {
    /// Confirmation line shown after a successful scan.
    pub fn confirmation_message(&self) -> String {
        format!(
            "¡Oferta redimida! {} en {}",
            self.offer_title, self.business_name
        )
    }
}

/// Counter and row count for one offer, for audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerSnapshot {
    pub offer_id: Uuid,
    pub max_redemptions: i32,
    pub current_redemptions: i32,
    pub redemption_rows: i64,
}

impl LedgerSnapshot {
    /// The counter must equal the number of persisted redemptions.
    pub fn is_consistent(&self) -> bool {
        i64::from(self.current_redemptions) == self.redemption_rows
            && self.current_redemptions <= self.max_redemptions
    }
}
