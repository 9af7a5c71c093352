//! Storage port for offers and redemptions.

use chrono::{DateTime, Utc};
use shared::pagination::Cursor;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{LedgerSnapshot, Offer, OfferView, Redeemer, Redemption};

/// An offer together with the name of the business that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRecord {
    pub offer: Offer,
    pub business_name: String,
}

/// Result of the conditional increment-and-append.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalRedeem {
    /// Counter incremented and redemption appended in one unit.
    Applied {
        redemption: Redemption,
        /// Offer state after the commit.
        offer: Offer,
    },
    /// Nothing was written. Carries the offer state the condition was
    /// evaluated against, or `None` if the offer no longer exists.
    NotApplied { offer: Option<Offer> },
}

/// Active-offer query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    /// Instant the "unexpired" condition is evaluated at.
    pub now: DateTime<Utc>,
    /// `None` means unbounded.
    pub limit: Option<u32>,
    /// Only rows strictly after this position in `(created_at DESC, id DESC)` order.
    pub after: Option<Cursor>,
    /// Exact match on the business category.
    pub category: Option<String>,
}

impl FeedQuery {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            limit: None,
            after: None,
            category: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.after = cursor;
        self
    }

    pub fn in_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Persistent catalog of offers and redemption records.
///
/// Implementations must execute [`OfferStore::redeem_if_available`] as a
/// single serializable unit: the capacity, activity and expiry conditions are
/// re-checked at commit time and either both writes happen or neither does.
#[async_trait::async_trait]
pub trait OfferStore: Send + Sync {
    /// Point lookup by the unique redemption code.
    async fn find_by_code(&self, code: &str) -> Result<Option<OfferRecord>, StoreError>;

    /// Increment `current_redemptions` by one if the offer is active, not
    /// expired at `at`, and below capacity, appending a redemption attributed
    /// to `redeemer` in the same unit.
    async fn redeem_if_available(
        &self,
        offer_id: Uuid,
        redeemer: &Redeemer,
        at: DateTime<Utc>,
    ) -> Result<ConditionalRedeem, StoreError>;

    /// Active, unexpired offers, newest first.
    async fn list_active(&self, query: &FeedQuery) -> Result<Vec<OfferView>, StoreError>;

    /// Counter and persisted row count for one offer.
    async fn redemption_ledger(&self, offer_id: Uuid)
        -> Result<Option<LedgerSnapshot>, StoreError>;
}
