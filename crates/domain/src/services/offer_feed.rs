//! Offer feed reader.
//!
//! Read-only queries over currently redeemable offers. Every call is a pure
//! read, so repeated calls with no intervening writes return identical feeds.

use serde::Serialize;
use shared::pagination::{clamp_page_size, decode_cursor, encode_cursor};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::FeedError;
use crate::models::{GeoPoint, OfferView};
use crate::services::clock::Clock;
use crate::services::store::{FeedQuery, OfferStore};

/// Size of the home screen feed.
pub const HOME_FEED_LIMIT: u32 = 10;

/// A page of offers, newest first unless ranked by distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferFeed {
    pub offers: Vec<OfferView>,
    /// Opaque cursor for the next page, `None` on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl OfferFeed {
    /// Zero offers is a valid result, distinct from a failed fetch.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }
}

/// Selects currently valid offers for display.
#[derive(Clone)]
pub struct OfferFeedReader {
    store: Arc<dyn OfferStore>,
    clock: Arc<dyn Clock>,
}

impl OfferFeedReader {
    pub fn new(store: Arc<dyn OfferStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Active, unexpired offers, newest first. `None` means unbounded.
    pub async fn list_active_offers(&self, limit: Option<u32>) -> Result<OfferFeed, FeedError> {
        let query = FeedQuery::at(self.clock.now()).with_limit(limit);
        let offers = self.fetch(&query).await?;
        Ok(OfferFeed {
            offers,
            next_cursor: None,
        })
    }

    /// One page of the full listing, keyset paginated on `(created_at, id)`.
    pub async fn list_page(
        &self,
        cursor: Option<&str>,
        per_page: Option<u32>,
        category: Option<&str>,
    ) -> Result<OfferFeed, FeedError> {
        let after = cursor
            .map(decode_cursor)
            .transpose()
            .map_err(|e| FeedError::InvalidQuery(e.to_string()))?;

        let category = match category.map(str::trim) {
            Some(c) => {
                shared::validation::validate_category(c)
                    .map_err(|_| FeedError::InvalidQuery("invalid category".to_string()))?;
                Some(c.to_string())
            }
            None => None,
        };

        let per_page = clamp_page_size(per_page);
        // Fetch one extra row to learn whether another page exists.
        let query = FeedQuery::at(self.clock.now())
            .with_limit(Some(per_page + 1))
            .after(after)
            .in_category(category);

        let mut offers = self.fetch(&query).await?;
        let has_more = offers.len() > per_page as usize;
        offers.truncate(per_page as usize);

        let next_cursor = if has_more {
            offers
                .last()
                .map(|last| encode_cursor(last.created_at, last.id))
        } else {
            None
        };

        Ok(OfferFeed {
            offers,
            next_cursor,
        })
    }

    /// Active offers within `radius_km` of `origin`, nearest first.
    pub async fn list_nearby(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        limit: Option<u32>,
    ) -> Result<OfferFeed, FeedError> {
        origin
            .validate()
            .map_err(|_| FeedError::InvalidQuery("coordinates out of range".to_string()))?;
        shared::validation::validate_radius_km(radius_km)
            .map_err(|_| FeedError::InvalidQuery("radius out of range".to_string()))?;

        let query = FeedQuery::at(self.clock.now());
        let mut offers: Vec<OfferView> = self
            .fetch(&query)
            .await?
            .into_iter()
            .filter_map(|mut view| {
                let distance = origin.distance_km(&view.location);
                (distance <= radius_km).then(|| {
                    view.distance_km = Some(distance);
                    view
                })
            })
            .collect();

        offers.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        offers.truncate(clamp_page_size(limit) as usize);

        debug!(
            latitude = origin.latitude,
            longitude = origin.longitude,
            radius_km,
            found = offers.len(),
            "Nearby offers"
        );

        Ok(OfferFeed {
            offers,
            next_cursor: None,
        })
    }

    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<OfferView>, FeedError> {
        self.store.list_active(query).await.map_err(|e| {
            error!(error = %e, "Offer feed query failed");
            FeedError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessSummary, Discount, DiscountKind, Offer};
    use crate::services::clock::FixedClock;
    use crate::services::in_memory::InMemoryOfferStore;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    const PLAZA: GeoPoint = GeoPoint {
        latitude: -33.4372,
        longitude: -70.6506,
    };

    struct Fixture {
        store: Arc<InMemoryOfferStore>,
        clock: Arc<FixedClock>,
        reader: OfferFeedReader,
        business: BusinessSummary,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryOfferStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let business = BusinessSummary {
            id: Uuid::new_v4(),
            name: "Café del Centro".to_string(),
            category: "Café".to_string(),
            logo_url: None,
            address: "Huérfanos 1000".to_string(),
            phone: Some("+56 2 2345 6789".to_string()),
        };
        store.insert_business(business.clone()).await;
        let reader = OfferFeedReader::new(store.clone(), clock.clone());
        Fixture {
            store,
            clock,
            reader,
            business,
        }
    }

    impl Fixture {
        /// Seeds an offer created `age_min` minutes ago at `location`.
        async fn seed(&self, code: &str, age_min: i64, location: GeoPoint) -> Offer {
            let now = self.clock.now();
            let offer = Offer {
                id: Uuid::new_v4(),
                business_id: self.business.id,
                title: format!("Oferta {}", code),
                description: String::new(),
                discount: Discount {
                    kind: DiscountKind::Percentage,
                    value: 30.0,
                },
                original_price: 10000.0,
                final_price: 7000.0,
                qr_code: code.to_string(),
                is_active: true,
                is_urgent: false,
                expires_at: now + Duration::hours(2),
                max_redemptions: 10,
                current_redemptions: 0,
                location,
                image_url: None,
                created_at: now - Duration::minutes(age_min),
                updated_at: now - Duration::minutes(age_min),
            };
            self.store.insert_offer(offer.clone()).await.unwrap();
            offer
        }
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_capped() {
        let fx = fixture().await;
        for i in 0..15 {
            fx.seed(&format!("C{}", i), i, PLAZA).await;
        }

        let feed = fx
            .reader
            .list_active_offers(Some(HOME_FEED_LIMIT))
            .await
            .unwrap();
        assert_eq!(feed.len(), 10);
        assert_eq!(feed.offers[0].title, "Oferta C0");
        assert!(feed
            .offers
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));

        let unbounded = fx.reader.list_active_offers(None).await.unwrap();
        assert_eq!(unbounded.len(), 15);
    }

    #[tokio::test]
    async fn test_feed_excludes_offer_at_expiry_instant() {
        let fx = fixture().await;
        let offer = fx.seed("SOON", 1, PLAZA).await;

        fx.clock.set(offer.expires_at);
        let feed = fx.reader.list_active_offers(None).await.unwrap();
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_empty_feed_is_not_an_error() {
        let fx = fixture().await;
        let feed = fx.reader.list_active_offers(Some(10)).await.unwrap();
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_classified() {
        let fx = fixture().await;
        fx.store.set_unavailable(true);
        let result = fx.reader.list_active_offers(Some(10)).await;
        assert!(matches!(result, Err(FeedError::Storage(_))));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let fx = fixture().await;
        for i in 0..4 {
            fx.seed(&format!("R{}", i), i, PLAZA).await;
        }

        let first = fx.reader.list_active_offers(None).await.unwrap();
        let second = fx.reader.list_active_offers(None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pages_cover_listing_without_overlap() {
        let fx = fixture().await;
        for i in 0..5 {
            fx.seed(&format!("P{}", i), i, PLAZA).await;
        }

        let first = fx.reader.list_page(None, Some(2), None).await.unwrap();
        assert_eq!(first.len(), 2);
        let cursor = first.next_cursor.clone().unwrap();

        let second = fx
            .reader
            .list_page(Some(&cursor), Some(2), None)
            .await
            .unwrap();
        let third = fx
            .reader
            .list_page(second.next_cursor.as_deref(), Some(2), None)
            .await
            .unwrap();

        assert_eq!(third.len(), 1);
        assert!(third.next_cursor.is_none());

        let mut ids: Vec<_> = first
            .offers
            .iter()
            .chain(&second.offers)
            .chain(&third.offers)
            .map(|o| o.id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_bad_cursor_is_invalid_query() {
        let fx = fixture().await;
        let result = fx.reader.list_page(Some("not a cursor"), None, None).await;
        assert!(matches!(result, Err(FeedError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_category_filter() {
        let fx = fixture().await;
        fx.seed("CAT", 1, PLAZA).await;

        let matching = fx.reader.list_page(None, None, Some("Café")).await.unwrap();
        assert_eq!(matching.len(), 1);
        let other = fx.reader.list_page(None, None, Some("Cine")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_nearby_ranked_by_distance_within_radius() {
        let fx = fixture().await;
        let providencia = GeoPoint::new(-33.4263, -70.6100);
        let valparaiso = GeoPoint::new(-33.0472, -71.6127);

        fx.seed("FAR", 1, providencia).await;
        fx.seed("NEAR", 2, PLAZA).await;
        fx.seed("OUT", 3, valparaiso).await;

        let feed = fx.reader.list_nearby(PLAZA, 10.0, None).await.unwrap();
        let titles: Vec<_> = feed.offers.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Oferta NEAR", "Oferta FAR"]);
        assert!(feed.offers[0].distance_km.unwrap() < 0.01);
        assert!(feed.offers[1].distance_km.unwrap() > 3.0);
    }

    #[tokio::test]
    async fn test_nearby_rejects_bad_radius() {
        let fx = fixture().await;
        let result = fx.reader.list_nearby(PLAZA, 0.0, None).await;
        assert!(matches!(result, Err(FeedError::InvalidQuery(_))));
        let result = fx.reader.list_nearby(GeoPoint::new(95.0, 0.0), 5.0, None).await;
        assert!(matches!(result, Err(FeedError::InvalidQuery(_))));
    }
}
