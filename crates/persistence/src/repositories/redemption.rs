//! Redemption repository for database operations.
//!
//! Redemptions are append-only; there is no update or delete.

use chrono::{DateTime, Utc};
use domain::models::{LedgerSnapshot, Redeemer, Redemption};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::decode;
use crate::entities::redemption::{LedgerEntity, RedemptionEntity};
use crate::metrics::QueryTimer;

/// Repository for redemption database operations.
#[derive(Clone)]
pub struct RedemptionRepository {
    pool: PgPool,
}

impl RedemptionRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a redemption inside the caller's transaction.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
        redeemer: &Redeemer,
        at: DateTime<Utc>,
    ) -> Result<Redemption, sqlx::Error> {
        let timer = QueryTimer::new("insert_redemption");

        let result = sqlx::query_as::<_, RedemptionEntity>(
            r#"
            INSERT INTO redemptions (offer_id, redeemer_kind, redeemer_subject, redeemed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, offer_id, redeemer_kind, redeemer_subject, redeemed_at
            "#,
        )
        .bind(offer_id)
        .bind(redeemer.kind_str())
        .bind(redeemer.subject())
        .bind(at)
        .fetch_one(&mut **tx)
        .await;

        timer.finish(&result);
        result.and_then(decode)
    }

    /// Most recent redemptions for an offer.
    pub async fn list_for_offer(
        &self,
        offer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Redemption>, sqlx::Error> {
        let timer = QueryTimer::new("list_redemptions_for_offer");

        let result = sqlx::query_as::<_, RedemptionEntity>(
            r#"
            SELECT id, offer_id, redeemer_kind, redeemer_subject, redeemed_at
            FROM redemptions
            WHERE offer_id = $1
            ORDER BY redeemed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(offer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        timer.finish(&result);
        result.and_then(|rows| rows.into_iter().map(decode).collect())
    }

    /// Counter and ledger row count for an offer.
    pub async fn ledger(&self, offer_id: Uuid) -> Result<Option<LedgerSnapshot>, sqlx::Error> {
        let timer = QueryTimer::new("redemption_ledger");

        let result = sqlx::query_as::<_, LedgerEntity>(
            r#"
            SELECT o.id AS offer_id,
                   o.max_redemptions,
                   o.current_redemptions,
                   (SELECT COUNT(*) FROM redemptions r WHERE r.offer_id = o.id) AS redemption_rows
            FROM offers o
            WHERE o.id = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish(&result);
        result.map(|entity| entity.map(Into::into))
    }
}
