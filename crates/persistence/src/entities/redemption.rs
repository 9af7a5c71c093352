//! Redemption entities for database operations.

use chrono::{DateTime, Utc};
use domain::models::{LedgerSnapshot, Redeemer, Redemption};
use sqlx::FromRow;
use uuid::Uuid;

use super::RowDecodeError;

/// Database entity for redemptions.
#[derive(Debug, Clone, FromRow)]
pub struct RedemptionEntity {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub redeemer_kind: String,
    pub redeemer_subject: Option<String>,
    pub redeemed_at: DateTime<Utc>,
}

impl TryFrom<RedemptionEntity> for Redemption {
    type Error = RowDecodeError;

    fn try_from(entity: RedemptionEntity) -> Result<Self, Self::Error> {
        let has_subject = entity.redeemer_subject.is_some();
        let redeemer = Redeemer::from_parts(&entity.redeemer_kind, entity.redeemer_subject)
            .ok_or_else(|| RowDecodeError::InvalidRedeemer {
                kind: entity.redeemer_kind.clone(),
                has_subject,
            })?;

        Ok(Redemption {
            id: entity.id,
            offer_id: entity.offer_id,
            redeemer,
            redeemed_at: entity.redeemed_at,
        })
    }
}

/// Counter and ledger row count for one offer.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntity {
    pub offer_id: Uuid,
    pub max_redemptions: i32,
    pub current_redemptions: i32,
    pub redemption_rows: i64,
}

impl From<LedgerEntity> for LedgerSnapshot {
    fn from(entity: LedgerEntity) -> Self {
        LedgerSnapshot {
            offer_id: entity.offer_id,
            max_redemptions: entity.max_redemptions,
            current_redemptions: entity.current_redemptions,
            redemption_rows: entity.redemption_rows,
        }
    }
}
