//! Domain services for Flashy.
//!
//! Services contain business logic that operates on domain models. Storage,
//! identity and time are reached only through the traits defined here.

pub mod alerts;
pub mod clock;
pub mod identity;
pub mod in_memory;
pub mod offer_feed;
pub mod redemption;
pub mod store;

pub use alerts::{
    new_deal_alerts, urgent_alerts, AlertHub, DEFAULT_ALERT_HISTORY,
    DEFAULT_URGENCY_WINDOW_MINUTES,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{AnonymousIdentity, IdentityProvider, ResolvedIdentity};
pub use in_memory::{FaultPoint, InMemoryOfferStore};
pub use offer_feed::{OfferFeed, OfferFeedReader, HOME_FEED_LIMIT};
pub use redemption::{RedemptionValidator, DEFAULT_MAX_ATTEMPTS};
pub use store::{ConditionalRedeem, FeedQuery, OfferRecord, OfferStore};
