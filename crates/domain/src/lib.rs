//! Domain layer for the Flashy deals backend.
//!
//! This crate contains:
//! - Domain models (Offer, Redemption, BusinessProfile, UrgencyAlert)
//! - The redemption validator and offer feed reader
//! - Storage-agnostic ports and an in-memory store
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
