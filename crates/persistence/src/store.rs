//! PostgreSQL-backed [`OfferStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::error::StoreError;
use domain::models::{LedgerSnapshot, OfferView, Redeemer};
use domain::services::{ConditionalRedeem, FeedQuery, OfferRecord, OfferStore};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::repositories::{OfferRepository, RedemptionRepository};

/// SQLSTATE codes for aborts that leave nothing applied and may be retried.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Offer store over the `offers` and `redemptions` tables.
#[derive(Clone)]
pub struct PgOfferStore {
    pool: PgPool,
    offers: OfferRepository,
    redemptions: RedemptionRepository,
}

impl PgOfferStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            offers: OfferRepository::new(pool.clone()),
            redemptions: RedemptionRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn offers(&self) -> &OfferRepository {
        &self.offers
    }

    pub fn redemptions(&self) -> &RedemptionRepository {
        &self.redemptions
    }
}

/// Classifies a database error for the store contract.
pub fn store_error(err: sqlx::Error) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
            warn!(error = %err, "Transaction aborted by concurrent update");
            StoreError::Conflict(err.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<OfferRecord>, StoreError> {
        let found = self.offers.find_by_code(code).await.map_err(store_error)?;
        Ok(found.map(|(offer, business_name)| OfferRecord {
            offer,
            business_name,
        }))
    }

    async fn redeem_if_available(
        &self,
        offer_id: Uuid,
        redeemer: &Redeemer,
        at: DateTime<Utc>,
    ) -> Result<ConditionalRedeem, StoreError> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let Some(offer) = OfferRepository::increment_if_available(&mut tx, offer_id, at)
            .await
            .map_err(store_error)?
        else {
            let fresh = OfferRepository::find_by_id_in(&mut tx, offer_id)
                .await
                .map_err(store_error)?;
            tx.rollback().await.map_err(store_error)?;
            return Ok(ConditionalRedeem::NotApplied { offer: fresh });
        };

        let redemption = RedemptionRepository::insert(&mut tx, offer_id, redeemer, at)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(ConditionalRedeem::Applied { redemption, offer })
    }

    async fn list_active(&self, query: &FeedQuery) -> Result<Vec<OfferView>, StoreError> {
        self.offers.list_active(query).await.map_err(store_error)
    }

    async fn redemption_ledger(
        &self,
        offer_id: Uuid,
    ) -> Result<Option<LedgerSnapshot>, StoreError> {
        self.redemptions.ledger(offer_id).await.map_err(store_error)
    }
}
