//! Offer repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{Discount, GeoPoint, Offer, OfferView};
use domain::services::FeedQuery;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::decode;
use crate::entities::offer::{
    OfferEntity, OfferFeedRowEntity, OfferWithBusinessNameEntity, OFFER_COLUMNS,
};
use crate::metrics::QueryTimer;

/// Fields for seeding an offer.
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub discount: Discount,
    pub original_price: f64,
    pub final_price: f64,
    pub qr_code: String,
    pub is_active: bool,
    pub is_urgent: bool,
    pub expires_at: DateTime<Utc>,
    pub max_redemptions: i32,
    pub location: GeoPoint,
    pub image_url: Option<String>,
}

/// Repository for offer database operations.
#[derive(Clone)]
pub struct OfferRepository {
    pool: PgPool,
}

impl OfferRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an offer. Used by seeding and fixtures; offers are otherwise
    /// managed outside this service.
    pub async fn create(&self, input: &NewOffer) -> Result<Offer, sqlx::Error> {
        let timer = QueryTimer::new("create_offer");

        let sql = format!(
            r#"
            INSERT INTO offers AS o (
                business_id, title, description, discount_type, discount_value,
                original_price, final_price, qr_code, is_active, is_urgent, expires_at,
                max_redemptions, latitude, longitude, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {OFFER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, OfferEntity>(&sql)
            .bind(input.business_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.discount.kind.as_str())
            .bind(input.discount.value)
            .bind(input.original_price)
            .bind(input.final_price)
            .bind(&input.qr_code)
            .bind(input.is_active)
            .bind(input.is_urgent)
            .bind(input.expires_at)
            .bind(input.max_redemptions)
            .bind(input.location.latitude)
            .bind(input.location.longitude)
            .bind(&input.image_url)
            .fetch_one(&self.pool)
            .await;

        timer.finish(&result);
        result.and_then(decode)
    }

    /// Find an offer by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>, sqlx::Error> {
        let timer = QueryTimer::new("find_offer_by_id");

        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers o WHERE o.id = $1");
        let result = sqlx::query_as::<_, OfferEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        timer.finish(&result);
        result.and_then(|entity| entity.map(decode).transpose())
    }

    /// Find an offer and its business name by redemption code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<(Offer, String)>, sqlx::Error> {
        let timer = QueryTimer::new("find_offer_by_code");

        let sql = format!(
            r#"
            SELECT {OFFER_COLUMNS}, b.business_name
            FROM offers o
            JOIN business_profiles b ON b.id = o.business_id
            WHERE o.qr_code = $1
            "#
        );
        let result = sqlx::query_as::<_, OfferWithBusinessNameEntity>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await;

        timer.finish(&result);
        result.and_then(|row| {
            row.map(|r| -> Result<_, sqlx::Error> { Ok((decode(r.offer)?, r.business_name)) })
                .transpose()
        })
    }

    /// Increment the redemption counter if the offer is active, unexpired at
    /// `at`, and below capacity. Returns the updated offer, or `None` when the
    /// condition did not hold.
    ///
    /// The row lock taken by the UPDATE serializes concurrent callers; each
    /// re-evaluates the condition against the committed counter.
    pub async fn increment_if_available(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let timer = QueryTimer::new("increment_offer_redemptions");

        let sql = format!(
            r#"
            UPDATE offers AS o
            SET current_redemptions = current_redemptions + 1,
                updated_at = $2
            WHERE o.id = $1
              AND o.is_active
              AND o.expires_at > $2
              AND o.current_redemptions < o.max_redemptions
            RETURNING {OFFER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, OfferEntity>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&mut **tx)
            .await;

        timer.finish(&result);
        result.and_then(|entity| entity.map(decode).transpose())
    }

    /// Read an offer inside an open transaction.
    pub async fn find_by_id_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers o WHERE o.id = $1");
        let entity = sqlx::query_as::<_, OfferEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        entity.map(decode).transpose()
    }

    /// Active, unexpired offers joined with their business, newest first.
    pub async fn list_active(&self, query: &FeedQuery) -> Result<Vec<OfferView>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_offers");

        let sql = format!(
            r#"
            SELECT {OFFER_COLUMNS},
                   b.business_name,
                   b.business_type,
                   b.logo_url AS business_logo_url,
                   b.address AS business_address,
                   b.phone AS business_phone
            FROM offers o
            JOIN business_profiles b ON b.id = o.business_id
            WHERE o.is_active
              AND o.expires_at > $1
              AND ($2::timestamptz IS NULL OR (o.created_at, o.id) < ($2, $3))
              AND ($4::text IS NULL OR b.business_type = $4)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $5
            "#
        );
        let result = sqlx::query_as::<_, OfferFeedRowEntity>(&sql)
            .bind(query.now)
            .bind(query.after.map(|c| c.created_at))
            .bind(query.after.map(|c| c.id))
            .bind(&query.category)
            .bind(query.limit.map(i64::from))
            .fetch_all(&self.pool)
            .await;

        timer.finish(&result);
        result.and_then(|rows| rows.into_iter().map(decode).collect())
    }

    /// Flip `is_active` off for offers expired at `now`. Returns the number
    /// of offers deactivated.
    pub async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_expired_offers");

        let result = sqlx::query(
            r#"
            UPDATE offers
            SET is_active = FALSE, updated_at = $1
            WHERE is_active AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await;

        timer.finish(&result);
        Ok(result?.rows_affected())
    }
}
