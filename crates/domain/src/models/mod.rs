//! Domain models for Flashy.

pub mod alert;
pub mod business;
pub mod location;
pub mod offer;
pub mod redemption;

pub use alert::{AlertKind, UrgencyAlert};
pub use business::{BusinessProfile, BusinessSummary};
pub use location::GeoPoint;
pub use offer::{validate_prices, Discount, DiscountKind, Offer, OfferView};
pub use redemption::{LedgerSnapshot, Redeemer, Redemption, RedemptionReceipt};
