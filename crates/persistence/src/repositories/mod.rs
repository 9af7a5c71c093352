//! Repository implementations for database operations.

pub mod business_profile;
pub mod offer;
pub mod redemption;

pub use business_profile::{BusinessProfileRepository, NewBusinessProfile};
pub use offer::{NewOffer, OfferRepository};
pub use redemption::RedemptionRepository;
