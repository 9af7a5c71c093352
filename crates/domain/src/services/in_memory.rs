//! In-memory offer store for development and testing.
//!
//! A single async mutex serializes every operation, so the conditional
//! redeem is linearizable exactly like the database transaction it stands in
//! for. Faults can be injected to exercise the all-or-nothing path.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    validate_prices, BusinessSummary, LedgerSnapshot, Offer, OfferView, Redeemer, Redemption,
};
use crate::services::store::{ConditionalRedeem, FeedQuery, OfferRecord, OfferStore};

/// Where an injected fault interrupts the next conditional redeem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// After the counter was incremented, before the redemption is appended.
    AfterIncrement,
    /// After both writes were staged, before they are committed.
    BeforeCommit,
    /// Abort as a concurrent-update conflict before any write.
    Conflict,
}

#[derive(Debug, Default)]
struct State {
    offers: HashMap<Uuid, Offer>,
    codes: HashMap<String, Uuid>,
    businesses: HashMap<Uuid, BusinessSummary>,
    redemptions: Vec<Redemption>,
    faults: Vec<FaultPoint>,
}

/// Offer store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryOfferStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a business.
    pub async fn insert_business(&self, business: BusinessSummary) {
        let mut state = self.state.lock().await;
        state.businesses.insert(business.id, business);
    }

    /// Adds an offer. Redemption codes are unique and never reassigned.
    pub async fn insert_offer(&self, offer: Offer) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.codes.contains_key(&offer.qr_code) {
            return Err(StoreError::Unavailable(format!(
                "qr_code {} already issued",
                offer.qr_code
            )));
        }
        if !state.businesses.contains_key(&offer.business_id) {
            return Err(StoreError::Unavailable(format!(
                "business {} does not exist",
                offer.business_id
            )));
        }
        if validate_prices(offer.original_price, offer.final_price).is_err() {
            return Err(StoreError::Unavailable(format!(
                "offer {} has inconsistent prices",
                offer.id
            )));
        }
        state.codes.insert(offer.qr_code.clone(), offer.id);
        state.offers.insert(offer.id, offer);
        Ok(())
    }

    /// Queues a fault for an upcoming conditional redeem. Faults fire in the
    /// order they were queued, one per call.
    pub async fn inject_fault(&self, fault: FaultPoint) {
        self.state.lock().await.faults.push(fault);
    }

    /// Makes every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn offer(&self, id: Uuid) -> Option<Offer> {
        self.state.lock().await.offers.get(&id).cloned()
    }

    pub async fn redemptions_for(&self, offer_id: Uuid) -> Vec<Redemption> {
        self.state
            .lock()
            .await
            .redemptions
            .iter()
            .filter(|r| r.offer_id == offer_id)
            .cloned()
            .collect()
    }

    /// Flips `is_active` off for offers expired at `now`. Returns how many
    /// offers changed.
    pub async fn deactivate_expired(&self, now: DateTime<Utc>) -> u64 {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for offer in state.offers.values_mut() {
            if offer.is_active && offer.is_expired_at(now) {
                offer.is_active = false;
                offer.updated_at = now;
                changed += 1;
            }
        }
        changed
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl OfferStore for InMemoryOfferStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<OfferRecord>, StoreError> {
        self.ensure_available()?;
        let state = self.state.lock().await;

        let Some(offer) = state.codes.get(code).and_then(|id| state.offers.get(id)) else {
            return Ok(None);
        };
        let business_name = state
            .businesses
            .get(&offer.business_id)
            .map(|b| b.name.clone())
            .unwrap_or_default();

        Ok(Some(OfferRecord {
            offer: offer.clone(),
            business_name,
        }))
    }

    async fn redeem_if_available(
        &self,
        offer_id: Uuid,
        redeemer: &Redeemer,
        at: DateTime<Utc>,
    ) -> Result<ConditionalRedeem, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;

        let fault = if state.faults.is_empty() {
            None
        } else {
            Some(state.faults.remove(0))
        };
        if fault == Some(FaultPoint::Conflict) {
            return Err(StoreError::Conflict("injected serialization failure".to_string()));
        }

        let Some(current) = state.offers.get(&offer_id).cloned() else {
            return Ok(ConditionalRedeem::NotApplied { offer: None });
        };

        if current.check_redeemable(at).is_err() {
            return Ok(ConditionalRedeem::NotApplied {
                offer: Some(current),
            });
        }

        // Stage both writes on copies; nothing is visible until the commit below.
        let mut staged_offer = current;
        staged_offer.current_redemptions += 1;
        staged_offer.updated_at = at;

        if fault == Some(FaultPoint::AfterIncrement) {
            return Err(StoreError::Unavailable(
                "injected fault after counter increment".to_string(),
            ));
        }

        let redemption = Redemption {
            id: Uuid::new_v4(),
            offer_id,
            redeemer: redeemer.clone(),
            redeemed_at: at,
        };

        if fault == Some(FaultPoint::BeforeCommit) {
            return Err(StoreError::Unavailable(
                "injected fault before commit".to_string(),
            ));
        }

        state.offers.insert(offer_id, staged_offer.clone());
        state.redemptions.push(redemption.clone());

        Ok(ConditionalRedeem::Applied {
            redemption,
            offer: staged_offer,
        })
    }

    async fn list_active(&self, query: &FeedQuery) -> Result<Vec<OfferView>, StoreError> {
        self.ensure_available()?;
        let state = self.state.lock().await;

        let mut views: Vec<OfferView> = state
            .offers
            .values()
            .filter(|offer| offer.is_listable(query.now))
            .filter(|offer| match query.after {
                Some(cursor) => (offer.created_at, offer.id) < (cursor.created_at, cursor.id),
                None => true,
            })
            .filter_map(|offer| {
                let business = state.businesses.get(&offer.business_id)?;
                match &query.category {
                    Some(category) if &business.category != category => None,
                    _ => Some(OfferView::new(offer, business.clone())),
                }
            })
            .collect();

        views.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        if let Some(limit) = query.limit {
            views.truncate(limit as usize);
        }

        Ok(views)
    }

    async fn redemption_ledger(
        &self,
        offer_id: Uuid,
    ) -> Result<Option<LedgerSnapshot>, StoreError> {
        self.ensure_available()?;
        let state = self.state.lock().await;

        Ok(state.offers.get(&offer_id).map(|offer| LedgerSnapshot {
            offer_id,
            max_redemptions: offer.max_redemptions,
            current_redemptions: offer.current_redemptions,
            redemption_rows: state
                .redemptions
                .iter()
                .filter(|r| r.offer_id == offer_id)
                .count() as i64,
        }))
    }
}
