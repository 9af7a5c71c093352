//! Offer entities for database operations.

use chrono::{DateTime, Utc};
use domain::models::{BusinessSummary, Discount, DiscountKind, GeoPoint, Offer, OfferView};
use sqlx::FromRow;
use uuid::Uuid;

use super::RowDecodeError;

/// Column list shared by every query returning an [`OfferEntity`].
pub const OFFER_COLUMNS: &str = "o.id, o.business_id, o.title, o.description, o.discount_type, \
     o.discount_value, o.original_price, o.final_price, o.qr_code, o.is_active, o.is_urgent, o.expires_at, o.max_redemptions, \
     o.current_redemptions, o.latitude, o.longitude, o.image_url, o.created_at, o.updated_at";

/// Database entity for offers.
#[derive(Debug, Clone, FromRow)]
pub struct OfferEntity {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_type: String,
    pub discount_value: f64,
    pub original_price: f64,
    pub final_price: f64,
    pub qr_code: String,
    pub is_active: bool,
    pub is_urgent: bool,
    pub expires_at: DateTime<Utc>,
    pub max_redemptions: i32,
    pub current_redemptions: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OfferEntity> for Offer {
    type Error = RowDecodeError;

    fn try_from(entity: OfferEntity) -> Result<Self, Self::Error> {
        let kind = DiscountKind::parse(&entity.discount_type)
            .ok_or_else(|| RowDecodeError::UnknownDiscountType(entity.discount_type.clone()))?;

        Ok(Offer {
            id: entity.id,
            business_id: entity.business_id,
            title: entity.title,
            description: entity.description,
            discount: Discount {
                kind,
                value: entity.discount_value,
            },
            original_price: entity.original_price,
            final_price: entity.final_price,
            qr_code: entity.qr_code,
            is_active: entity.is_active,
            is_urgent: entity.is_urgent,
            expires_at: entity.expires_at,
            max_redemptions: entity.max_redemptions,
            current_redemptions: entity.current_redemptions,
            location: GeoPoint::new(entity.latitude, entity.longitude),
            image_url: entity.image_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

/// Offer row with the owning business's display name.
#[derive(Debug, Clone, FromRow)]
pub struct OfferWithBusinessNameEntity {
    #[sqlx(flatten)]
    pub offer: OfferEntity,
    pub business_name: String,
}

/// Offer row joined with its business, as listed in feeds.
#[derive(Debug, Clone, FromRow)]
pub struct OfferFeedRowEntity {
    #[sqlx(flatten)]
    pub offer: OfferEntity,
    pub business_name: String,
    pub business_type: String,
    pub business_logo_url: Option<String>,
    pub business_address: String,
    pub business_phone: Option<String>,
}

impl TryFrom<OfferFeedRowEntity> for OfferView {
    type Error = RowDecodeError;

    fn try_from(row: OfferFeedRowEntity) -> Result<Self, Self::Error> {
        let business = BusinessSummary {
            id: row.offer.business_id,
            name: row.business_name,
            category: row.business_type,
            logo_url: row.business_logo_url,
            address: row.business_address,
            phone: row.business_phone,
        };
        let offer = Offer::try_from(row.offer)?;
        Ok(OfferView::new(&offer, business))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entity() -> OfferEntity {
        let now = Utc::now();
        OfferEntity {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            title: "Café + Medialuna".to_string(),
            description: "Desayuno express".to_string(),
            discount_type: "fixed_amount".to_string(),
            discount_value: 1500.0,
            original_price: 4500.0,
            final_price: 3000.0,
            qr_code: "FLASHY-CAF-002".to_string(),
            is_active: true,
            is_urgent: true,
            expires_at: now + Duration::minutes(15),
            max_redemptions: 30,
            current_redemptions: 28,
            latitude: -33.4372,
            longitude: -70.6506,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_offer_entity_to_domain() {
        let entity = entity();
        let offer = Offer::try_from(entity.clone()).unwrap();
        assert_eq!(offer.id, entity.id);
        assert_eq!(offer.qr_code, "FLASHY-CAF-002");
        assert_eq!(offer.discount.kind, DiscountKind::FixedAmount);
        assert_eq!(offer.remaining_capacity(), 2);
        assert_eq!(offer.location.longitude, -70.6506);
        assert_eq!(offer.original_price, 4500.0);
        assert_eq!(offer.final_price, 3000.0);
        assert_eq!(offer.savings(), 1500.0);
    }

    #[test]
    fn test_unknown_discount_type_is_a_decode_error() {
        let mut entity = entity();
        entity.discount_type = "bogo".to_string();

        assert_eq!(
            Offer::try_from(entity).unwrap_err(),
            RowDecodeError::UnknownDiscountType("bogo".to_string())
        );
    }

    #[test]
    fn test_decode_error_surfaces_as_sqlx_decode() {
        let mut entity = entity();
        entity.discount_type = "bogo".to_string();

        let result: Result<Offer, sqlx::Error> = crate::entities::decode(entity);
        assert!(matches!(result, Err(sqlx::Error::Decode(_))));
    }

    #[test]
    fn test_feed_row_to_view() {
        let row = OfferFeedRowEntity {
            offer: entity(),
            business_name: "Café del Centro".to_string(),
            business_type: "Café".to_string(),
            business_logo_url: None,
            business_address: "Huérfanos 1000".to_string(),
            business_phone: None,
        };
        let business_id = row.offer.business_id;

        let view = OfferView::try_from(row).unwrap();
        assert_eq!(view.business.id, business_id);
        assert_eq!(view.business.name, "Café del Centro");
        assert_eq!(view.discount_label, "$1500");
        assert!(view.distance_km.is_none());
        assert_eq!(view.original_price, 4500.0);
        assert_eq!(view.final_price, 3000.0);
        assert_eq!(view.savings, 1500.0);
    }
}
