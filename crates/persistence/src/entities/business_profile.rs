//! Business profile entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::{BusinessProfile, GeoPoint};
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for business profiles.
#[derive(Debug, Clone, FromRow)]
pub struct BusinessProfileEntity {
    pub id: Uuid,
    pub business_name: String,
    pub business_type: String,
    pub logo_url: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl From<BusinessProfileEntity> for BusinessProfile {
    fn from(entity: BusinessProfileEntity) -> Self {
        BusinessProfile {
            id: entity.id,
            name: entity.business_name,
            category: entity.business_type,
            logo_url: entity.logo_url,
            address: entity.address,
            phone: entity.phone,
            location: GeoPoint::new(entity.latitude, entity.longitude),
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_profile_entity_to_domain() {
        let entity = BusinessProfileEntity {
            id: Uuid::new_v4(),
            business_name: "Empanadas La Chilena".to_string(),
            business_type: "Comida Rápida".to_string(),
            logo_url: None,
            address: "Av. Providencia 1234, Santiago".to_string(),
            phone: Some("+56 9 8765 4321".to_string()),
            latitude: -33.4263,
            longitude: -70.61,
            created_at: Utc::now(),
        };

        let profile: BusinessProfile = entity.clone().into();
        assert_eq!(profile.name, entity.business_name);
        assert_eq!(profile.category, "Comida Rápida");
        assert_eq!(profile.location.latitude, -33.4263);
    }
}
