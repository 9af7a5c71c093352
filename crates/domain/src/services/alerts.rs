//! Urgency alerts.
//!
//! Alerts are derived from the active feed and fanned out through an
//! [`AlertHub`]. Subscribers receive each alert once; late joiners can read
//! the most recent ones.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{AlertKind, OfferView, UrgencyAlert};

/// Offers expiring within this many minutes are announced as urgent.
pub const DEFAULT_URGENCY_WINDOW_MINUTES: i64 = 20;

/// Alerts kept for [`AlertHub::recent`].
pub const DEFAULT_ALERT_HISTORY: usize = 50;

/// Urgent alerts for offers with `0 < minutes_left < window`.
pub fn urgent_alerts(offers: &[OfferView], now: DateTime<Utc>, window: Duration) -> Vec<UrgencyAlert> {
    let window_minutes = window.num_minutes();
    offers
        .iter()
        .filter_map(|offer| {
            let minutes_left = offer.minutes_left(now);
            if minutes_left <= 0 || minutes_left >= window_minutes {
                return None;
            }
            Some(UrgencyAlert {
                kind: AlertKind::Urgent,
                offer_id: offer.id,
                offer_title: offer.title.clone(),
                business_name: offer.business.name.clone(),
                category: offer.business.category.clone(),
                discount_label: offer.discount_label.clone(),
                expires_at: offer.expires_at,
                minutes_left,
                message: format!(
                    "¡Solo quedan {} minutos! {} en {}",
                    minutes_left, offer.discount_label, offer.business.name
                ),
                raised_at: now,
            })
        })
        .collect()
}

/// New-deal alerts for offers created after `since`.
pub fn new_deal_alerts(
    offers: &[OfferView],
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<UrgencyAlert> {
    offers
        .iter()
        .filter(|offer| offer.created_at > since)
        .map(|offer| UrgencyAlert {
            kind: AlertKind::NewDeal,
            offer_id: offer.id,
            offer_title: offer.title.clone(),
            business_name: offer.business.name.clone(),
            category: offer.business.category.clone(),
            discount_label: offer.discount_label.clone(),
            expires_at: offer.expires_at,
            minutes_left: offer.minutes_left(now),
            message: format!(
                "Nueva oferta: {} en {}",
                offer.discount_label, offer.business.name
            ),
            raised_at: now,
        })
        .collect()
}

#[derive(Debug, Default)]
struct HubState {
    recent: VecDeque<UrgencyAlert>,
    /// Expiry of every announced `(offer, kind)`, pruned once the offer expires.
    announced: HashMap<(Uuid, AlertKind), DateTime<Utc>>,
}

/// Fan-out point for alerts.
#[derive(Debug)]
pub struct AlertHub {
    sender: broadcast::Sender<UrgencyAlert>,
    state: Mutex<HubState>,
    history: usize,
}

impl AlertHub {
    pub fn new(history: usize) -> Self {
        let capacity = history.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            state: Mutex::new(HubState::default()),
            history: capacity,
        }
    }

    /// Publishes an alert unless the same `(offer, kind)` was already
    /// announced. Returns whether the alert was new.
    pub fn publish(&self, alert: UrgencyAlert) -> bool {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let key = (alert.offer_id, alert.kind);
            if state.announced.contains_key(&key) {
                return false;
            }
            state.announced.insert(key, alert.expires_at);

            if state.recent.len() == self.history {
                state.recent.pop_front();
            }
            state.recent.push_back(alert.clone());
        }

        // No subscribers is not an error; the alert stays in `recent`.
        let _ = self.sender.send(alert);
        true
    }

    /// Publishes each alert, returning how many were new.
    pub fn publish_all(&self, alerts: impl IntoIterator<Item = UrgencyAlert>) -> usize {
        alerts.into_iter().filter(|a| self.publish(a.clone())).count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UrgencyAlert> {
        self.sender.subscribe()
    }

    /// Most recent alerts, newest first.
    pub fn recent(&self, limit: usize) -> Vec<UrgencyAlert> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.recent.iter().rev().take(limit).cloned().collect()
    }

    /// Drops dedupe entries and history for offers expired at `now`.
    pub fn forget_expired(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.announced.retain(|_, expires_at| *expires_at > now);
        state.recent.retain(|alert| alert.expires_at > now);
    }
}

impl Default for AlertHub {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessSummary, Discount, DiscountKind, GeoPoint};

    fn view(minutes_left: i64, now: DateTime<Utc>) -> OfferView {
        let discount = Discount {
            kind: DiscountKind::Percentage,
            value: 40.0,
        };
        OfferView {
            id: Uuid::new_v4(),
            title: "Happy hour".to_string(),
            description: String::new(),
            discount,
            discount_label: discount.label(),
            original_price: 5000.0,
            final_price: 3000.0,
            savings: 2000.0,
            is_urgent: true,
            expires_at: now + Duration::minutes(minutes_left) + Duration::seconds(30),
            max_redemptions: 10,
            current_redemptions: 2,
            remaining_capacity: 8,
            location: GeoPoint::new(-33.44, -70.65),
            image_url: None,
            created_at: now - Duration::hours(1),
            business: BusinessSummary {
                id: Uuid::new_v4(),
                name: "Bar Nacional".to_string(),
                category: "Bar".to_string(),
                logo_url: None,
                address: "Bandera 317".to_string(),
                phone: None,
            },
            distance_km: None,
        }
    }

    #[test]
    fn test_urgent_window() {
        let now = Utc::now();
        let offers = vec![view(5, now), view(19, now), view(20, now), view(90, now)];

        let alerts = urgent_alerts(&offers, now, Duration::minutes(20));
        let minutes: Vec<_> = alerts.iter().map(|a| a.minutes_left).collect();
        assert_eq!(minutes, vec![5, 19]);
        assert!(alerts.iter().all(|a| a.kind == AlertKind::Urgent));
        assert_eq!(alerts[0].message, "¡Solo quedan 5 minutos! 40% en Bar Nacional");
    }

    #[test]
    fn test_new_deal_alerts() {
        let now = Utc::now();
        let offers = vec![view(60, now)];
        assert_eq!(new_deal_alerts(&offers, now - Duration::hours(2), now).len(), 1);
        assert!(new_deal_alerts(&offers, now, now).is_empty());
    }

    #[test]
    fn test_publish_dedupes_per_offer_and_kind() {
        let hub = AlertHub::new(10);
        let now = Utc::now();
        let offers = vec![view(5, now)];
        let alert = urgent_alerts(&offers, now, Duration::minutes(20)).remove(0);

        assert!(hub.publish(alert.clone()));
        assert!(!hub.publish(alert));
        assert_eq!(hub.recent(10).len(), 1);

        let deal = new_deal_alerts(&offers, now - Duration::hours(2), now).remove(0);
        assert!(hub.publish(deal));
        assert_eq!(hub.recent(10).len(), 2);
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let hub = AlertHub::new(2);
        let now = Utc::now();
        let offers: Vec<_> = (1..=3).map(|m| view(m, now)).collect();
        let alerts = urgent_alerts(&offers, now, Duration::minutes(20));

        assert_eq!(hub.publish_all(alerts.clone()), 3);
        let recent = hub.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].offer_id, alerts[2].offer_id);
    }

    #[test]
    fn test_forget_expired_allows_reannounce_and_prunes_history() {
        let hub = AlertHub::new(10);
        let now = Utc::now();
        let offers = vec![view(5, now)];
        let alert = urgent_alerts(&offers, now, Duration::minutes(20)).remove(0);
        hub.publish(alert.clone());

        hub.forget_expired(now + Duration::hours(1));
        assert!(hub.recent(10).is_empty());
        assert!(hub.publish(alert));
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_alerts() {
        let hub = AlertHub::default();
        let mut rx = hub.subscribe();
        let now = Utc::now();
        let alert = urgent_alerts(&[view(3, now)], now, Duration::minutes(20)).remove(0);

        hub.publish(alert.clone());
        assert_eq!(rx.recv().await.unwrap(), alert);
    }
}
