//! HTTP service for Flashy: offer feeds, redemptions and urgency alerts.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
