//! Redemption validator.
//!
//! Turns a scanned code into a redemption record. The read-side checks only
//! give fast rejections; whether a slot is really free is decided by the
//! store's conditional redeem at commit time.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{RedemptionError, StoreError};
use crate::models::{Offer, RedemptionReceipt};
use crate::services::clock::Clock;
use crate::services::identity::IdentityProvider;
use crate::services::store::{ConditionalRedeem, OfferStore};

/// Total attempts (first try included) when the store reports a conflict.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Validates redemption codes and records redemptions.
#[derive(Clone)]
pub struct RedemptionValidator {
    store: Arc<dyn OfferStore>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl RedemptionValidator {
    pub fn new(store: Arc<dyn OfferStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the conflict retry budget. Values below one are treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Redeems the offer identified by `raw_code` on behalf of `identity`.
    ///
    /// Exactly one redemption is recorded and the offer's counter advances by
    /// one, or nothing is written at all.
    pub async fn redeem(
        &self,
        raw_code: &str,
        identity: &dyn IdentityProvider,
    ) -> Result<RedemptionReceipt, RedemptionError> {
        let Some(code) = shared::validation::normalize_redemption_code(raw_code) else {
            debug!("Rejected redemption: empty or malformed code");
            return Err(RedemptionError::InvalidInput);
        };

        let redeemer = identity.requester();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let now = self.clock.now();

            let record = self
                .store
                .find_by_code(code)
                .await
                .map_err(|e| storage_failure(code, e))?
                .ok_or_else(|| {
                    debug!(code = %code, "Rejected redemption: unknown code");
                    RedemptionError::NotFound
                })?;

            if let Err(rejection) = record.offer.check_redeemable(now) {
                log_rejection(code, &record.offer, &rejection);
                return Err(rejection);
            }

            match self
                .store
                .redeem_if_available(record.offer.id, &redeemer, now)
                .await
            {
                Ok(ConditionalRedeem::Applied { redemption, offer }) => {
                    info!(
                        offer_id = %offer.id,
                        redemption_id = %redemption.id,
                        redeemer = redemption.redeemer.kind_str(),
                        remaining = offer.remaining_capacity(),
                        "Offer redeemed"
                    );
                    return Ok(RedemptionReceipt {
                        redemption_id: redemption.id,
                        offer_id: offer.id,
                        offer_title: offer.title,
                        business_name: record.business_name,
                        redeemed_at: redemption.redeemed_at,
                        remaining_capacity: (offer.max_redemptions - offer.current_redemptions)
                            .max(0),
                    });
                }
                Ok(ConditionalRedeem::NotApplied { offer: None }) => {
                    debug!(code = %code, "Rejected redemption: offer vanished before commit");
                    return Err(RedemptionError::NotFound);
                }
                Ok(ConditionalRedeem::NotApplied { offer: Some(fresh) }) => {
                    return match fresh.check_redeemable(now) {
                        Err(rejection) => {
                            log_rejection(code, &fresh, &rejection);
                            Err(rejection)
                        }
                        Ok(()) => {
                            error!(
                                offer_id = %fresh.id,
                                "Store declined a redemption the offer state allows"
                            );
                            Err(RedemptionError::Storage(
                                "conditional redeem declined without a failing rule".to_string(),
                            ))
                        }
                    };
                }
                Err(StoreError::Conflict(reason)) if attempt < self.max_attempts => {
                    warn!(
                        offer_id = %record.offer.id,
                        attempt,
                        reason = %reason,
                        "Redemption conflicted with a concurrent writer, retrying"
                    );
                }
                Err(e) => return Err(storage_failure(code, e)),
            }
        }
    }
}

fn log_rejection(code: &str, offer: &Offer, rejection: &RedemptionError) {
    debug!(
        code = %code,
        offer_id = %offer.id,
        outcome = rejection.code(),
        "Rejected redemption"
    );
}

fn storage_failure(code: &str, err: StoreError) -> RedemptionError {
    error!(code = %code, error = %err, "Redemption failed on storage");
    RedemptionError::Storage(err.to_string())
}
