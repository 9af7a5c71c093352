//! Business profile repository for database operations.

use domain::models::{BusinessProfile, GeoPoint};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::business_profile::BusinessProfileEntity;
use crate::metrics::QueryTimer;

/// Fields for seeding a business profile.
#[derive(Debug, Clone)]
pub struct NewBusinessProfile {
    pub name: String,
    pub category: String,
    pub logo_url: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub location: GeoPoint,
}

/// Repository for business profile database operations.
#[derive(Clone)]
pub struct BusinessProfileRepository {
    pool: PgPool,
}

impl BusinessProfileRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a business profile. Used by seeding and fixtures.
    pub async fn create(&self, input: &NewBusinessProfile) -> Result<BusinessProfile, sqlx::Error> {
        let timer = QueryTimer::new("create_business_profile");

        let result = sqlx::query_as::<_, BusinessProfileEntity>(
            r#"
            INSERT INTO business_profiles (business_name, business_type, logo_url, address, phone, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, business_name, business_type, logo_url, address, phone, latitude, longitude, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.logo_url)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.location.latitude)
        .bind(input.location.longitude)
        .fetch_one(&self.pool)
        .await;

        timer.finish(&result);
        result.map(Into::into)
    }

    /// Find a business profile by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BusinessProfile>, sqlx::Error> {
        let timer = QueryTimer::new("find_business_profile_by_id");

        let result = sqlx::query_as::<_, BusinessProfileEntity>(
            r#"
            SELECT id, business_name, business_type, logo_url, address, phone, latitude, longitude, created_at
            FROM business_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish(&result);
        result.map(|entity| entity.map(Into::into))
    }
}
