//! HTTP route handlers.

pub mod admin;
pub mod alerts;
pub mod businesses;
pub mod health;
pub mod offers;
pub mod redemptions;
