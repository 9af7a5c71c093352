//! Business profile domain model.
//!
//! Profiles are owned by the business-management side; this service only reads
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::GeoPoint;

/// A business publishing offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusinessProfile {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
}

/// Business fields nested into offer views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusinessSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&BusinessProfile> for BusinessSummary {
    fn from(profile: &BusinessProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            category: profile.category.clone(),
            logo_url: profile.logo_url.clone(),
            address: profile.address.clone(),
            phone: profile.phone.clone(),
        }
    }
}
