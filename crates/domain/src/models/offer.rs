//! Offer domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationError;

use crate::error::RedemptionError;
use crate::models::business::BusinessSummary;
use crate::models::location::GeoPoint;

/// How an offer's discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

impl DiscountKind {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::FixedAmount => "fixed_amount",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(DiscountKind::Percentage),
            "fixed_amount" => Some(DiscountKind::FixedAmount),
            _ => None,
        }
    }
}

/// Discount terms of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: f64,
}

impl Discount {
    /// Percentages must be in (0, 100]; fixed amounts must be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ok = match self.kind {
            DiscountKind::Percentage => self.value > 0.0 && self.value <= 100.0,
            DiscountKind::FixedAmount => self.value > 0.0,
        };
        if ok {
            Ok(())
        } else {
            let mut err = ValidationError::new("discount_value");
            err.message = Some("Discount value is out of range for its kind".into());
            Err(err)
        }
    }

    /// Short label for cards and alerts, e.g. `25%` or `$1500`.
    pub fn label(&self) -> String {
        match self.kind {
            DiscountKind::Percentage => format!("{}%", trim_number(self.value)),
            DiscountKind::FixedAmount => format!("${}", trim_number(self.value)),
        }
    }
}

/// Both prices must be non-negative and the final price may not exceed the
/// original one.
pub fn validate_prices(original_price: f64, final_price: f64) -> Result<(), ValidationError> {
    if original_price >= 0.0 && final_price >= 0.0 && final_price <= original_price {
        Ok(())
    } else {
        let mut err = ValidationError::new("final_price");
        err.message = Some("Final price must be between zero and the original price".into());
        Err(err)
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// A time- and quantity-limited discount published by a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Offer {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub discount: Discount,
    /// Price before the discount.
    pub original_price: f64,
    /// Price the customer pays.
    pub final_price: f64,
    /// Redemption code carried by the business's QR. Immutable once issued.
    pub qr_code: String,
    pub is_active: bool,
    pub is_urgent: bool,
    pub expires_at: DateTime<Utc>,
    pub max_redemptions: i32,
    pub current_redemptions: i32,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Applies the redemption rules in order: active, then unexpired, then
    /// capacity. An offer is already expired at its `expires_at` instant.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), RedemptionError> {
        if !self.is_active {
            return Err(RedemptionError::Inactive);
        }
        if self.is_expired_at(now) {
            return Err(RedemptionError::Expired);
        }
        if self.current_redemptions >= self.max_redemptions {
            return Err(RedemptionError::CapacityExceeded);
        }
        Ok(())
    }

    /// Whether the offer is expired at `now` (boundary inclusive).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the offer belongs in the feed at `now`.
    pub fn is_listable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Remaining redeemable slots.
    pub fn remaining_capacity(&self) -> i32 {
        (self.max_redemptions - self.current_redemptions).max(0)
    }

    /// Whole minutes until expiry, zero once expired.
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }

    pub fn savings(&self) -> f64 {
        (self.original_price - self.final_price).max(0.0)
    }
}

/// Offer as shown in feeds, with its business nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OfferView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount: Discount,
    pub discount_label: String,
    pub original_price: f64,
    pub final_price: f64,
    pub savings: f64,
    pub is_urgent: bool,
    pub expires_at: DateTime<Utc>,
    pub max_redemptions: i32,
    pub current_redemptions: i32,
    pub remaining_capacity: i32,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub business: BusinessSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl OfferView {
    /// Builds the display record. The redemption code is deliberately not
    /// part of the view; it is only shown on the business's own QR.
    pub fn new(offer: &Offer, business: BusinessSummary) -> Self {
        Self {
            id: offer.id,
            title: offer.title.clone(),
            description: offer.description.clone(),
            discount: offer.discount,
            discount_label: offer.discount.label(),
            original_price: offer.original_price,
            final_price: offer.final_price,
            savings: offer.savings(),
            is_urgent: offer.is_urgent,
            expires_at: offer.expires_at,
            max_redemptions: offer.max_redemptions,
            current_redemptions: offer.current_redemptions,
            remaining_capacity: offer.remaining_capacity(),
            location: offer.location,
            image_url: offer.image_url.clone(),
            created_at: offer.created_at,
            business,
            distance_km: None,
        }
    }

    /// Whole minutes until expiry, zero once expired.
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }
}
